//! Per-request render state.
//!
//! A [`RequestContext`] carries the request id used in log spans and the
//! current-zone marker. One context belongs to one page render, so concurrent
//! renders never see each other's zones.

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{FuseError, Result};

/// State threaded through every zone operation of a single render.
#[derive(Debug)]
pub struct RequestContext {
    id: String,
    current_zone: Mutex<Option<String>>,
}

impl RequestContext {
    /// Create a context with a random request id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current_zone: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the zone being resolved, if any.
    pub fn current_zone(&self) -> Option<String> {
        self.current_zone.lock().clone()
    }

    /// Mark `zone` as current until the returned guard is dropped.
    ///
    /// Fails with [`FuseError::NestedZone`] if another zone is already current.
    pub fn enter_zone(&self, zone: &str) -> Result<ZoneGuard<'_>> {
        let mut current = self.current_zone.lock();
        if let Some(active) = current.as_ref() {
            return Err(FuseError::NestedZone {
                active: active.clone(),
                requested: zone.to_string(),
            });
        }
        *current = Some(zone.to_string());
        Ok(ZoneGuard { context: self })
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the current-zone marker on drop.
#[must_use = "the zone is cleared as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ZoneGuard<'a> {
    context: &'a RequestContext,
}

impl Drop for ZoneGuard<'_> {
    fn drop(&mut self) {
        *self.context.current_zone.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_set_and_cleared() {
        let request = RequestContext::with_id("req-1");
        assert_eq!(request.current_zone(), None);
        {
            let _guard = request.enter_zone("sidebar").unwrap();
            assert_eq!(request.current_zone().as_deref(), Some("sidebar"));
        }
        assert_eq!(request.current_zone(), None);
    }

    #[test]
    fn test_nested_zone_rejected() {
        let request = RequestContext::new();
        let _guard = request.enter_zone("outer").unwrap();
        match request.enter_zone("inner") {
            Err(FuseError::NestedZone { active, requested }) => {
                assert_eq!(active, "outer");
                assert_eq!(requested, "inner");
            }
            other => panic!("expected NestedZone, got {other:?}"),
        }
        assert_eq!(request.current_zone().as_deref(), Some("outer"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(RequestContext::new().id(), RequestContext::new().id());
    }
}
