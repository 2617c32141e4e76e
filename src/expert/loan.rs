//! Loan usury check script
//!
//! Stage 1: ask for the loan rate and its period
//! Stage 2: annualise the rate and compare it with the legal limits
//!
//! Limits: 20%/year civil-law cap; five times the cap (100%/year) is the
//! criminal usury threshold.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::signals::{RatePeriod, Signals};
use super::{mentions_any, run_script, ExpertScript, ScriptReply, Stage};
use crate::completion::CompletionClient;
use crate::lang::Language;
use crate::models::Message;
use crate::prompt::PromptTask;
use crate::Result;

const TOPICS: &[&str] = &["vay", "lãi suất", "usury", "loan", "nặng lãi"];
const STAGES: u8 = 2;

pub const CIVIL_CAP_PERCENT: f64 = 20.0;
pub const CRIMINAL_MULTIPLE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsuryVerdict {
    Legal,
    AboveCivilCap,
    CriminalUsury,
}

pub fn annual_rate(rate_percent: f64, period: RatePeriod) -> f64 {
    rate_percent * period.periods_per_year()
}

pub fn usury_verdict(annual_percent: f64) -> UsuryVerdict {
    if annual_percent > CIVIL_CAP_PERCENT * CRIMINAL_MULTIPLE {
        UsuryVerdict::CriminalUsury
    } else if annual_percent > CIVIL_CAP_PERCENT {
        UsuryVerdict::AboveCivilCap
    } else {
        UsuryVerdict::Legal
    }
}

pub fn loan_stage(signals: &Signals) -> u8 {
    if signals.interest_rate.is_some() && signals.rate_period.is_some() {
        2
    } else {
        1
    }
}

fn format_percent(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn period_name(period: RatePeriod, language: Language) -> &'static str {
    match period {
        RatePeriod::Day => language.pick("ngày", "day"),
        RatePeriod::Month => language.pick("tháng", "month"),
        RatePeriod::Year => language.pick("năm", "year"),
    }
}

pub fn explain(rate_percent: f64, period: RatePeriod, language: Language) -> String {
    let annual = annual_rate(rate_percent, period);
    let lead = match language {
        Language::Vietnamese => format!(
            "Lãi suất {}% một {} tương đương khoảng {}% một năm.",
            format_percent(rate_percent),
            period_name(period, language),
            format_percent(annual)
        ),
        Language::English => format!(
            "A rate of {}% per {} is about {}% per year.",
            format_percent(rate_percent),
            period_name(period, language),
            format_percent(annual)
        ),
    };

    let verdict = match usury_verdict(annual) {
        UsuryVerdict::CriminalUsury => language.pick(
            "Mức này cao hơn 5 lần mức trần 20%/năm của Bộ luật Dân sự, đây là cho vay nặng lãi và người cho vay có thể bị truy cứu trách nhiệm hình sự.",
            "That is more than five times the 20%/year civil-law cap, so this is usury and the lender may face criminal liability.",
        ),
        UsuryVerdict::AboveCivilCap => language.pick(
            "Mức này vượt mức trần 20%/năm của Bộ luật Dân sự nên phần lãi vượt quá không được pháp luật bảo vệ, tuy nhiên chưa tới ngưỡng cho vay nặng lãi.",
            "That exceeds the 20%/year civil-law cap, so the excess interest is not legally enforceable, but it is below the criminal usury threshold.",
        ),
        UsuryVerdict::Legal => language.pick(
            "Mức này nằm trong giới hạn 20%/năm của Bộ luật Dân sự, không phải cho vay nặng lãi.",
            "That is within the 20%/year civil-law cap, so it is not usury.",
        ),
    };

    format!("{} {}", lead, verdict)
}

fn rate_question(language: Language) -> &'static str {
    language.pick(
        "Bạn cho mình biết lãi suất của khoản vay và lãi suất đó tính theo ngày, tháng hay năm nhé.",
        "Please tell me the interest rate of the loan and whether it is charged per day, month or year.",
    )
}

fn rate_suggestions(language: Language) -> Vec<String> {
    match language {
        Language::Vietnamese => vec!["3% một tháng".to_string(), "0.1% một ngày".to_string()],
        Language::English => vec!["3% per month".to_string(), "0.1% per day".to_string()],
    }
}

pub struct LoanScript {
    client: Arc<dyn CompletionClient>,
}

impl LoanScript {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExpertScript for LoanScript {
    fn name(&self) -> &'static str {
        "loan"
    }

    fn handles(&self, text: &str) -> bool {
        mentions_any(text, TOPICS)
    }

    async fn advance(&self, messages: &[Message]) -> Result<Option<ScriptReply>> {
        let run = run_script(self.client.as_ref(), PromptTask::LoanScript, STAGES, messages).await?;
        if run.model_stage == Stage::Break {
            info!(script = self.name(), "Script broke off");
            return Ok(None);
        }

        let stage = loan_stage(&run.signals);
        let agrees = run.agrees_with(self.name(), stage);
        let language = run.language;

        let reply = match (run.signals.interest_rate, run.signals.rate_period) {
            (Some(rate), Some(period)) => {
                info!(rate, period = ?period, annual = annual_rate(rate, period), "Loan rate checked");
                ScriptReply::new(explain(rate, period, language), Vec::new())
            }
            _ => ScriptReply::new(
                if agrees { run.reply } else { rate_question(language).to_string() },
                rate_suggestions(language),
            ),
        };

        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::MockCompletionClient;

    const NEEDLE: &str = "pre-defined loan check script";

    #[test]
    fn test_annualisation_and_verdicts() {
        assert_eq!(annual_rate(3.0, RatePeriod::Month), 36.0);
        assert_eq!(annual_rate(18.0, RatePeriod::Year), 18.0);

        assert_eq!(usury_verdict(18.0), UsuryVerdict::Legal);
        assert_eq!(usury_verdict(20.0), UsuryVerdict::Legal);
        assert_eq!(usury_verdict(36.0), UsuryVerdict::AboveCivilCap);
        assert_eq!(usury_verdict(100.0), UsuryVerdict::AboveCivilCap);
        assert_eq!(usury_verdict(annual_rate(1.0, RatePeriod::Day)), UsuryVerdict::CriminalUsury);
    }

    #[test]
    fn test_explain_vietnamese() {
        let text = explain(3.0, RatePeriod::Month, Language::Vietnamese);
        assert!(text.starts_with("Lãi suất 3% một tháng tương đương khoảng 36% một năm."));
        assert!(text.contains("vượt mức trần 20%/năm"));
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(36.0), "36");
        assert_eq!(format_percent(36.5), "36.5");
        assert_eq!(format_percent(0.1), "0.1");
    }

    #[tokio::test]
    async fn test_stage_two_is_deterministic() {
        let mock = MockCompletionClient::new().with_rule(
            NEEDLE,
            " User is telling the rate SET_INTEREST_RATE[1] SET_RATE_PERIOD[DAY].\nCurrent stage: Stage 2\n- Assistant: Mình đã tính.",
        );
        let script = LoanScript::new(Arc::new(mock));
        let reply = script
            .advance(&[Message::new("Huy", "1% một ngày")])
            .await
            .unwrap()
            .unwrap();
        assert!(reply.message.contains("365% một năm"));
        assert!(reply.message.contains("truy cứu trách nhiệm hình sự"));
        assert!(reply.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_stage_one_asks_rate() {
        let mock = MockCompletionClient::new().with_rule(
            NEEDLE,
            " User wants to check a loan.\nCurrent stage: Stage 1\n- Assistant: Bạn cho mình biết lãi suất nhé.",
        );
        let script = LoanScript::new(Arc::new(mock));
        let reply = script
            .advance(&[Message::new("Huy", "Khoản vay này có phải cho vay nặng lãi không?")])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.message, "Bạn cho mình biết lãi suất nhé.");
        assert_eq!(reply.suggestions[0], "3% một tháng");
    }

    #[test]
    fn test_topics() {
        let script = LoanScript::new(Arc::new(MockCompletionClient::new()));
        assert!(script.handles("Help me detect if a loan is usury or not"));
        assert!(!script.handles("Chuyển Nam 300k"));
    }
}
