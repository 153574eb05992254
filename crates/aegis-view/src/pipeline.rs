//! Render pipeline: mounted containers, the active view mode, and the
//! delegator that decodes events raised inside them.

use std::collections::HashMap;

use aegis_core::Role;
use tracing::{debug, error};

use crate::delegate::{EventDelegator, Intent, UiEvent};
use crate::render::{RenderContext, render};
use crate::ViewMode;

/// A render target and the markup it currently shows.
#[derive(Debug, Default, Clone)]
pub struct Container {
    markup: String,
    renders: u64,
}

impl Container {
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }
}

#[derive(Debug, Default)]
pub struct RenderPipeline {
    mode: ViewMode,
    containers: HashMap<String, Container>,
    delegator: EventDelegator,
}

impl RenderPipeline {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Switch presentation. The next render uses the new mode.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Register a container and attach the delegator to it (once).
    pub fn mount(&mut self, id: &str) {
        self.containers.entry(id.to_string()).or_default();
        self.delegator.attach(id);
    }

    pub fn unmount(&mut self, id: &str) {
        self.containers.remove(id);
        self.delegator.detach(id);
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn delegator(&self) -> &EventDelegator {
        &self.delegator
    }

    /// Replace the container's markup with a fresh render of `roles`.
    ///
    /// A missing container is logged and the render is skipped; returns
    /// whether anything was drawn.
    pub fn render(&mut self, id: &str, roles: &[Role], ctx: &RenderContext<'_>) -> bool {
        let Some(container) = self.containers.get_mut(id) else {
            error!(container = id, "render target not found");
            return false;
        };
        container.markup = render(self.mode, roles, ctx);
        container.renders += 1;
        debug!(container = id, mode = %self.mode, rows = roles.len(), "rendered");
        true
    }

    /// Decode an event raised inside a mounted container.
    pub fn handle_event(&self, id: &str, event: &UiEvent) -> Option<Intent> {
        self.delegator.handle(id, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{Action, AdjudicationStatus};

    fn roles() -> Vec<Role> {
        vec![Role::named("PM"), Role::named("QA")]
    }

    #[test]
    fn missing_container_aborts_quietly() {
        let mut pipeline = RenderPipeline::default();
        assert!(!pipeline.render("nowhere", &roles(), &RenderContext::default()));
        assert!(pipeline.container("nowhere").is_none());
    }

    #[test]
    fn repeated_renders_keep_one_listener() {
        let mut pipeline = RenderPipeline::new(ViewMode::Card);
        pipeline.mount("roles");
        for _ in 0..5 {
            assert!(pipeline.render("roles", &roles(), &RenderContext::default()));
        }
        pipeline.mount("roles");
        assert_eq!(pipeline.container("roles").unwrap().render_count(), 5);
        assert_eq!(pipeline.delegator().listener_count(), 1);

        let event = UiEvent::new("set-status").with("role", "PM").with("status", "rejected");
        assert_eq!(
            pipeline.handle_event("roles", &event),
            Some(Intent::Dispatch(Action::SetStatus {
                role_name: "PM".into(),
                status: AdjudicationStatus::Rejected,
            }))
        );
    }

    #[test]
    fn full_replace_on_each_render() {
        let mut pipeline = RenderPipeline::new(ViewMode::Table);
        pipeline.mount("roles");
        pipeline.render("roles", &roles(), &RenderContext::default());
        assert!(pipeline.container("roles").unwrap().markup().contains("data-role=\"QA\""));

        pipeline.render("roles", &roles()[..1], &RenderContext::default());
        let markup = pipeline.container("roles").unwrap().markup();
        assert!(!markup.contains("data-role=\"QA\""));
        assert_eq!(markup.matches("<table").count(), 1);
    }

    #[test]
    fn mode_switch_applies_on_next_render() {
        let mut pipeline = RenderPipeline::new(ViewMode::Table);
        pipeline.mount("roles");
        pipeline.set_mode(ViewMode::Tree);
        pipeline.render("roles", &roles(), &RenderContext::default());
        assert!(pipeline.container("roles").unwrap().markup().contains("data-view=\"tree\""));
    }

    #[test]
    fn unmounted_container_drops_events() {
        let mut pipeline = RenderPipeline::default();
        pipeline.mount("roles");
        pipeline.unmount("roles");
        assert!(pipeline.handle_event("roles", &UiEvent::new("undo")).is_none());
    }
}
