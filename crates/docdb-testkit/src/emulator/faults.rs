//! Scripted failures for exercising retry paths.

use std::sync::Mutex;

use crate::error::ClientError;
use crate::request::{DocumentRequest, OperationType};
use crate::resource::ResourceKind;

/// Fail matching requests with `error`, `remaining` times.
#[derive(Debug, Clone)]
pub struct FaultRule {
    pub operation: Option<OperationType>,
    pub kind: Option<ResourceKind>,
    pub error: ClientError,
    pub remaining: u32,
}

impl FaultRule {
    /// Matches every request once.
    pub fn new(error: ClientError) -> Self {
        Self {
            operation: None,
            kind: None,
            error,
            remaining: 1,
        }
    }

    pub fn times(mut self, n: u32) -> Self {
        self.remaining = n;
        self
    }

    pub fn on_operation(mut self, operation: OperationType) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn on_kind(mut self, kind: ResourceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn matches(&self, request: &DocumentRequest) -> bool {
        self.remaining > 0
            && self.operation.map_or(true, |op| op == request.operation)
            && self.kind.map_or(true, |kind| kind == request.kind)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Faults {
    rules: Mutex<Vec<FaultRule>>,
}

impl Faults {
    pub(crate) fn push(&self, rule: FaultRule) {
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        rules.push(rule);
    }

    /// Consume one firing of the first rule matching `request`.
    pub(crate) fn take(&self, request: &DocumentRequest) -> Option<ClientError> {
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        let idx = rules.iter().position(|rule| rule.matches(request))?;
        let rule = &mut rules[idx];
        rule.remaining -= 1;
        let error = rule.error.clone();
        if rule.remaining == 0 {
            rules.remove(idx);
        }
        Some(error)
    }

    pub(crate) fn clear(&self) {
        self.rules.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ResourceAddress;

    fn read_doc() -> DocumentRequest {
        DocumentRequest::new(
            OperationType::Read,
            ResourceKind::Document,
            ResourceAddress::document("d", "c", "x"),
            None,
        )
    }

    #[test]
    fn fires_the_configured_number_of_times() {
        let faults = Faults::default();
        faults.push(FaultRule::new(ClientError::gone()).times(2));
        assert!(faults.take(&read_doc()).is_some());
        assert!(faults.take(&read_doc()).is_some());
        assert!(faults.take(&read_doc()).is_none());
    }

    #[test]
    fn filters_by_operation_and_kind() {
        let faults = Faults::default();
        faults.push(
            FaultRule::new(ClientError::service_unavailable())
                .on_operation(OperationType::ReadFeed)
                .on_kind(ResourceKind::Document),
        );
        assert!(faults.take(&read_doc()).is_none());
        let mut feed = read_doc();
        feed.operation = OperationType::ReadFeed;
        assert_eq!(faults.take(&feed).map(|e| e.status), Some(503));
    }
}
