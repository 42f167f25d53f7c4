//! Contract risk scoring.
//!
//! Scores are normalized to 0..=100 where 100 means no findings. Every
//! deduction comes from a named rule in a versioned [`RuleSet`], so two
//! scores are comparable whenever their `rule_set` versions match.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_SCORE: u8 = 100;

/// How a GoPlus field triggers a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Field equals the given string flag ("1" or "0")
    Equals(&'static str),
    /// Field holds a non-zero address
    NonZeroAddress,
}

#[derive(Debug, Clone, Copy)]
pub struct RiskRule {
    pub field: &'static str,
    pub trigger: Trigger,
    pub deduction: u8,
    pub flag: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub version: &'static str,
    pub rules: &'static [RiskRule],
}

pub const GOPLUS_V1: RuleSet = RuleSet {
    version: "goplus-v1",
    rules: &[
        RiskRule { field: "is_honeypot", trigger: Trigger::Equals("1"), deduction: 40, flag: "Honeypot: sells are blocked" },
        RiskRule { field: "is_open_source", trigger: Trigger::Equals("0"), deduction: 10, flag: "Contract not open source" },
        RiskRule { field: "is_proxy", trigger: Trigger::Equals("1"), deduction: 5, flag: "Proxy contract" },
        RiskRule { field: "owner_address", trigger: Trigger::NonZeroAddress, deduction: 10, flag: "Ownership not renounced" },
        RiskRule { field: "can_take_back_ownership", trigger: Trigger::Equals("1"), deduction: 5, flag: "Can reclaim ownership" },
        RiskRule { field: "hidden_owner", trigger: Trigger::Equals("1"), deduction: 5, flag: "Hidden owner functions" },
        RiskRule { field: "is_mintable", trigger: Trigger::Equals("1"), deduction: 10, flag: "Mintable token" },
        RiskRule { field: "slippage_modifiable", trigger: Trigger::Equals("1"), deduction: 5, flag: "Modifiable slippage" },
        RiskRule { field: "is_blacklisted", trigger: Trigger::Equals("1"), deduction: 5, flag: "Blacklist function detected" },
        RiskRule { field: "trading_cooldown", trigger: Trigger::Equals("1"), deduction: 2, flag: "Cooldown logic in contract" },
    ],
};

/// Raw GoPlus `token_security` record for one address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityFlags(pub HashMap<String, serde_json::Value>);

impl SecurityFlags {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|v| v.as_str())
    }

    fn matches(&self, rule: &RiskRule) -> bool {
        match rule.trigger {
            Trigger::Equals(expected) => self.get_str(rule.field) == Some(expected),
            Trigger::NonZeroAddress => self
                .get_str(rule.field)
                .map(|addr| {
                    let hex = addr.trim().trim_start_matches("0x");
                    !hex.is_empty() && hex.chars().any(|c| c != '0')
                })
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Healthy,
    MinorConcerns,
    Risky,
    ExtremelyRisky,
}

impl RiskLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            85..=u8::MAX => RiskLabel::Healthy,
            60..=84 => RiskLabel::MinorConcerns,
            30..=59 => RiskLabel::Risky,
            _ => RiskLabel::ExtremelyRisky,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            RiskLabel::Healthy => "✅ healthy",
            RiskLabel::MinorConcerns => "⚠️ minor concerns",
            RiskLabel::Risky => "🚨 risky",
            RiskLabel::ExtremelyRisky => "💀 extremely risky",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub label: RiskLabel,
    pub flags: Vec<String>,
    pub rule_set: String,
}

impl RiskAssessment {
    /// Apply an extra deduction (e.g. wallet concentration) and relabel
    pub fn deduct(&mut self, points: u8, flag: impl Into<String>) {
        self.score = self.score.saturating_sub(points);
        self.label = RiskLabel::from_score(self.score);
        self.flags.push(flag.into());
    }

    /// First three flags, with an ellipsis when more exist
    pub fn flag_summary(&self) -> String {
        if self.flags.is_empty() {
            return "No major red flags".to_string();
        }
        let mut summary = self.flags.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
        if self.flags.len() > 3 {
            summary.push_str("...");
        }
        summary
    }
}

/// Why no assessment accompanies a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskAnnotation {
    Assessed(RiskAssessment),
    /// The chain has no security provider (solana, sui)
    NotCovered,
    /// Annotation turned off in configuration
    Disabled,
    /// Provider call failed; the quote is still served
    Unavailable(String),
}

impl RiskAnnotation {
    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            RiskAnnotation::Assessed(a) => Some(a),
            _ => None,
        }
    }
}

pub fn score_security(flags: &SecurityFlags, rule_set: &RuleSet) -> RiskAssessment {
    let mut score = MAX_SCORE;
    let mut found = Vec::new();

    for rule in rule_set.rules {
        if flags.matches(rule) {
            score = score.saturating_sub(rule.deduction);
            found.push(rule.flag.to_string());
        }
    }

    RiskAssessment {
        score,
        label: RiskLabel::from_score(score),
        flags: found,
        rule_set: rule_set.version.to_string(),
    }
}

/// Deduction for supply held by the five largest wallets. `holder_totals`
/// is the amount received per wallet, in any order; the share is taken
/// against the sum of all of them. Returns `None` when nothing applies.
pub fn wallet_concentration_penalty(holder_totals: &[f64]) -> Option<(u8, String)> {
    let mut totals: Vec<f64> = holder_totals
        .iter()
        .copied()
        .filter(|a| a.is_finite() && *a > 0.0)
        .collect();
    let total: f64 = totals.iter().sum();
    if total <= 0.0 {
        return None;
    }

    totals.sort_by(|a, b| b.total_cmp(a));
    let top5_pct = totals.iter().take(5).sum::<f64>() / total * 100.0;
    let deduction = if top5_pct > 80.0 {
        30
    } else if top5_pct > 50.0 {
        20
    } else if top5_pct > 30.0 {
        10
    } else {
        return None;
    };

    Some((deduction, format!("Top 5 wallets hold {:.1}%", top5_pct)))
}
