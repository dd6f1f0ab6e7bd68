use crate::analysis::rule::SemanticRule;

/// Rules in registration order, so diagnostics come out in a stable order
pub struct RuleRegistry {
    rules: Vec<Box<dyn SemanticRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Registers a rule, replacing an earlier one with the same id
    pub fn register<R: SemanticRule + 'static>(&mut self, rule: R) {
        self.rules.retain(|r| r.id() != rule.id());
        self.rules.push(Box::new(rule));
    }

    pub fn get_rule(&self, rule_id: &str) -> Option<&dyn SemanticRule> {
        self.rules.iter().find(|r| r.id() == rule_id).map(|r| r.as_ref())
    }

    pub fn get_all_rules(&self) -> Vec<&dyn SemanticRule> {
        self.rules.iter().map(|r| r.as_ref()).collect()
    }
}
