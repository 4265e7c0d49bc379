//! Request dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use dms_core::protocol::AgentId;
use dms_core::{ChangeEvent, DmError, DmResult, ListenerKind, Request, Response};

use crate::application::service::DisplayManagerService;

/// Seam between the socket code and the service, so the server can be
/// tested against a canned handler.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Produces the single response for `request`.  `Subscribe` is answered
    /// by the connection itself through [`RequestHandler::subscribe`].
    async fn handle(&self, request: Request) -> Response;

    fn subscribe(
        &self,
        agent: AgentId,
        kinds: &[ListenerKind],
    ) -> DmResult<UnboundedReceiver<ChangeEvent>>;

    fn unsubscribe_agent(&self, agent: AgentId);
}

pub struct ServiceRequestHandler {
    service: Arc<DisplayManagerService>,
    allow_snapshot: bool,
}

impl ServiceRequestHandler {
    /// `allow_snapshot` is the capture permission granted to every client.
    pub fn new(service: Arc<DisplayManagerService>, allow_snapshot: bool) -> Self {
        Self {
            service,
            allow_snapshot,
        }
    }
}

#[async_trait]
impl RequestHandler for ServiceRequestHandler {
    async fn handle(&self, request: Request) -> Response {
        debug!(?request, "dispatching request");
        let s = &self.service;
        match request {
            Request::GetDefaultDisplayId => Response::DefaultDisplayId(s.get_default_display_id()),
            Request::GetDisplayById(id) => Response::Display(s.get_display_by_id(id)),
            Request::GetAllDisplayIds => Response::DisplayIds(s.get_all_display_ids()),
            Request::GetDisplaySnapshot(id) => {
                Response::Snapshot(s.get_display_snapshot(id, self.allow_snapshot))
            }

            Request::GetAllScreenInfos => Response::Screens(s.get_all_screen_infos()),
            Request::GetAllScreenIds => Response::ScreenIds(s.get_all_screen_ids()),
            Request::GetScreenInfoById(id) => Response::Screen(s.get_screen_info_by_id(id)),
            Request::GetScreenGroupInfoById(id) => {
                Response::ScreenGroup(s.get_screen_group_info_by_id(id))
            }
            Request::CreateVirtualScreen(option) => {
                Response::CreatedScreen(s.create_virtual_screen(&option))
            }
            Request::DestroyVirtualScreen(id) => Response::Status(s.destroy_virtual_screen(id)),
            Request::SetVirtualScreenSurface { id, surface } => {
                Response::Status(s.set_virtual_screen_surface(id, surface))
            }
            Request::MakeMirror { main, targets } => {
                Response::Status(s.make_mirror(main, &targets))
            }
            Request::MakeExpand { ids, points } => Response::Status(s.make_expand(&ids, &points)),
            Request::StopMirror(ids) => Response::Status(s.stop_mirror(&ids)),
            Request::StopExpand(ids) => Response::Status(s.stop_expand(&ids)),
            Request::SetScreenActiveMode { id, mode_index } => {
                Response::Status(s.set_screen_active_mode(id, mode_index))
            }
            Request::SetOrientation { id, orientation } => {
                Response::Status(s.set_orientation(id, orientation))
            }
            Request::SetVirtualPixelRatio { id, ratio } => {
                Response::Status(s.set_virtual_pixel_ratio(id, ratio))
            }
            Request::GetSupportedColorGamuts(id) => {
                Response::ColorGamuts(s.get_supported_color_gamuts(id))
            }
            Request::GetColorGamut(id) => Response::ColorGamut(s.get_color_gamut(id)),
            Request::SetColorGamut { id, index } => Response::Status(s.set_color_gamut(id, index)),
            Request::GetGamutMap(id) => Response::GamutMap(s.get_gamut_map(id)),
            Request::SetGamutMap { id, map } => Response::Status(s.set_gamut_map(id, map)),

            Request::IsFoldable => Response::Foldable(s.is_foldable()),
            Request::GetFoldStatus => Response::FoldStatus(s.get_fold_status()),
            Request::GetFoldDisplayMode => Response::FoldDisplayMode(s.get_fold_display_mode()),
            Request::SetFoldDisplayMode(mode) => Response::Status(s.set_fold_display_mode(mode)),
            Request::LockFoldDisplayStatus(locked) => {
                Response::Status(s.lock_fold_display_status(locked))
            }
            Request::GetCurrentFoldCreaseRegion => {
                Response::CreaseRegion(s.get_current_fold_crease_region())
            }

            Request::Subscribe { .. } => Response::Status(Err(DmError::invalid(
                "subscribe is only valid on a streaming connection",
            ))),
        }
    }

    fn subscribe(
        &self,
        agent: AgentId,
        kinds: &[ListenerKind],
    ) -> DmResult<UnboundedReceiver<ChangeEvent>> {
        self.service.register_listener(agent, kinds)
    }

    fn unsubscribe_agent(&self, agent: AgentId) {
        let removed = self.service.unregister_agent(agent);
        debug!(%agent, removed, "listener agent removed");
    }
}
