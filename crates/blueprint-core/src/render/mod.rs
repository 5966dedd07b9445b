//! Text rendering of orchestrator state for hosts without a UI toolkit

pub mod status_render;

pub use status_render::{
    deliverable_links, progress_percent, render_status_card, status_badge, status_message,
    DeliverableLink,
};
