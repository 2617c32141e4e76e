//! Savings calculator script
//!
//! Stage 1: explain what can be calculated
//! Stage 2: ask for monthly income (a target is known)
//! Stage 3: income and target known → deterministic savings table

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::calculator::{format_vnd, group_thousands};
use super::signals::Signals;
use super::table::{SavingsGoal, SavingsTable, MAX_YEARS};
use super::{mentions_any, run_script, ExpertScript, ScriptReply, Stage};
use crate::completion::CompletionClient;
use crate::lang::Language;
use crate::models::Message;
use crate::prompt::PromptTask;
use crate::Result;

const TOPICS: &[&str] = &["tiết kiệm", "saving", "save money"];
const STAGES: u8 = 3;

const ASSUMPTIONS_VI: &str = "Ok. Dựa trên những thông tin bạn đưa ra, nếu như mỗi tháng bạn dành 10% thu nhập để tiết kiệm, hàng năm bạn được tăng 5% lương và lãi suất tiết kiệm của ngân hàng là 8%.";
const ASSUMPTIONS_EN: &str = "Ok. Based on your information, if you save 10% of your income every month, your salary grows 5% a year and the bank pays 8% interest a year.";

pub struct SavingsScript {
    client: Arc<dyn CompletionClient>,
}

impl SavingsScript {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

/// Transition function over the model's signals.
pub fn savings_stage(signals: &Signals) -> u8 {
    match (signals.income.is_some(), signals.has_target()) {
        (true, true) => 3,
        (false, true) => 2,
        _ => 1,
    }
}

/// The goal to honour. When both targets were captured, time wins.
pub fn savings_goal(signals: &Signals) -> Option<SavingsGoal> {
    match (signals.target_time, signals.target_money) {
        (Some(years), Some(_)) => {
            warn!("Both target money and target time captured, honouring target time");
            Some(SavingsGoal::Years(years))
        }
        (Some(years), None) => Some(SavingsGoal::Years(years)),
        (None, Some(amount)) => Some(SavingsGoal::Amount(amount)),
        (None, None) => None,
    }
}

fn options_suggestions(language: Language) -> Vec<String> {
    match language {
        Language::Vietnamese => vec![
            "Mình muốn được biết rằng trong bao lâu thì mình có thể tiết kiệm được 100 triệu đồng".to_string(),
            "Mình muốn biết nếu mình tiết kiệm 20 năm thì sẽ có bao nhiêu".to_string(),
        ],
        Language::English => vec![
            "I want to know how long it takes to save 100 million VND".to_string(),
            "I want to know how much I will have if I save for 20 years".to_string(),
        ],
    }
}

fn income_suggestions(language: Language) -> Vec<String> {
    vec![language.pick("5 triệu", "5 million VND").to_string()]
}

fn options_text(language: Language) -> &'static str {
    language.pick(
        "Đối với tiết kiệm thì mình có thể giúp bạn tính xem bạn nên tích lũy trong bao lâu để có thể có được mức mong muốn, hoặc nếu bạn tiết kiệm trong 1 khoảng thời gian nhất định thì bạn có thể tiết kiệm được bao nhiêu.",
        "For savings, I can calculate how long you need to save to reach a target amount, or how much you will have after saving for a given number of years.",
    )
}

fn income_question(language: Language) -> &'static str {
    language.pick(
        "Thu nhập hàng tháng của bạn là bao nhiêu?",
        "What is your monthly income?",
    )
}

fn money(amount: f64, language: Language) -> String {
    match language {
        Language::Vietnamese => format_vnd(amount),
        Language::English => format!("{} VND", group_thousands(amount)),
    }
}

/// Deterministic stage-3 answer.
pub fn summarize(table: &SavingsTable, language: Language) -> String {
    let markdown = table.to_markdown();
    let saved = money(table.final_saved(), language);
    let reached = table.reached_goal();
    match (table.goal, language) {
        (SavingsGoal::Years(years), Language::Vietnamese) if reached => format!(
            "{} Thì sau {} năm bạn sẽ có {}. Bạn có thể tham khảo thêm tại bảng sau:\n{}",
            ASSUMPTIONS_VI,
            years.max(1),
            saved,
            markdown
        ),
        (SavingsGoal::Years(years), Language::English) if reached => format!(
            "{} After {} years you will have {}. See the table below for details:\n{}",
            ASSUMPTIONS_EN,
            years.max(1),
            saved,
            markdown
        ),
        // Only the first MAX_YEARS years are tabulated
        (SavingsGoal::Years(years), Language::Vietnamese) => format!(
            "{} Mình chỉ tính được tối đa {} năm thay vì {} năm. Sau {} năm bạn sẽ có {}. Bạn có thể tham khảo thêm tại bảng sau:\n{}",
            ASSUMPTIONS_VI,
            table.years(),
            years,
            table.years(),
            saved,
            markdown
        ),
        (SavingsGoal::Years(years), Language::English) => format!(
            "{} I can only calculate up to {} years rather than {}. After {} years you will have {}. See the table below for details:\n{}",
            ASSUMPTIONS_EN,
            table.years(),
            years,
            table.years(),
            saved,
            markdown
        ),
        (SavingsGoal::Amount(target), Language::Vietnamese) if reached => format!(
            "{} Thì sau khoảng {} năm thì bạn có thể tiết kiệm được {}. Bạn có thể tham khảo thêm tại bảng sau:\n{}",
            ASSUMPTIONS_VI,
            table.years(),
            money(target, language),
            markdown
        ),
        (SavingsGoal::Amount(target), Language::English) if reached => format!(
            "{} You can save {} in about {} years. See the table below for details:\n{}",
            ASSUMPTIONS_EN,
            money(target, language),
            table.years(),
            markdown
        ),
        (SavingsGoal::Amount(target), Language::Vietnamese) => format!(
            "{} Sau {} năm bạn vẫn chỉ tiết kiệm được {}, chưa đạt mức {}.\n{}",
            ASSUMPTIONS_VI,
            MAX_YEARS,
            saved,
            money(target, language),
            markdown
        ),
        (SavingsGoal::Amount(target), Language::English) => format!(
            "{} After {} years you would still only have {}, short of {}.\n{}",
            ASSUMPTIONS_EN,
            MAX_YEARS,
            saved,
            money(target, language),
            markdown
        ),
    }
}

/// Fill `{time}`, `{money}` and `{INSERT_TABLE}` in the model's reply.
/// `None` when the reply has no placeholder to fill.
pub fn fill_placeholders(reply: &str, table: &SavingsTable) -> Option<String> {
    let has_placeholder = ["{time}", "{money}", "{INSERT_TABLE}"]
        .iter()
        .any(|p| reply.contains(p));
    if !has_placeholder || !table.reached_goal() {
        return None;
    }

    Some(
        reply
            .replace("{time}", &table.years().to_string())
            .replace("{money}", &format_vnd(table.final_saved()))
            .replace("{INSERT_TABLE}", &format!("\n{}", table.to_markdown())),
    )
}

#[async_trait]
impl ExpertScript for SavingsScript {
    fn name(&self) -> &'static str {
        "savings"
    }

    fn handles(&self, text: &str) -> bool {
        mentions_any(text, TOPICS)
    }

    async fn advance(&self, messages: &[Message]) -> Result<Option<ScriptReply>> {
        let run = run_script(self.client.as_ref(), PromptTask::SavingsScript, STAGES, messages).await?;
        if run.model_stage == Stage::Break {
            info!(script = self.name(), "Script broke off");
            return Ok(None);
        }

        let stage = savings_stage(&run.signals);
        let agrees = run.agrees_with(self.name(), stage);
        let language = run.language;

        let reply = match stage {
            1 => ScriptReply::new(
                if agrees { run.reply } else { options_text(language).to_string() },
                options_suggestions(language),
            ),
            2 => ScriptReply::new(
                if agrees { run.reply } else { income_question(language).to_string() },
                income_suggestions(language),
            ),
            _ => {
                let income = run.signals.income.unwrap_or_default();
                let Some(goal) = savings_goal(&run.signals) else {
                    return Ok(Some(ScriptReply::new(income_question(language), income_suggestions(language))));
                };
                let table = SavingsTable::build(income, goal);
                info!(years = table.years(), saved = table.final_saved(), "Savings table computed");

                let message = fill_placeholders(&run.reply, &table)
                    .filter(|_| agrees)
                    .unwrap_or_else(|| summarize(&table, language));
                ScriptReply::new(message, Vec::new())
            }
        };

        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::MockCompletionClient;

    const NEEDLE: &str = "pre-defined savings calculator script";

    fn script(completion: &str) -> (SavingsScript, Arc<MockCompletionClient>) {
        let mock = Arc::new(MockCompletionClient::new().with_rule(NEEDLE, completion));
        (SavingsScript::new(mock.clone()), mock)
    }

    fn ask(content: &str) -> Vec<Message> {
        vec![Message::new("Minh", content)]
    }

    #[test]
    fn test_transition_function() {
        let mut signals = Signals::default();
        assert_eq!(savings_stage(&signals), 1);
        signals.target_money = Some(100_000_000.0);
        assert_eq!(savings_stage(&signals), 2);
        signals.income = Some(8_000_000.0);
        assert_eq!(savings_stage(&signals), 3);

        let income_only = Signals {
            income: Some(8_000_000.0),
            ..Signals::default()
        };
        assert_eq!(savings_stage(&income_only), 1);
    }

    #[test]
    fn test_both_targets_honour_time() {
        let signals = Signals {
            target_money: Some(1.0),
            target_time: Some(5),
            ..Signals::default()
        };
        assert_eq!(savings_goal(&signals), Some(SavingsGoal::Years(5)));
    }

    #[tokio::test]
    async fn test_stage_one_suggests_both_cases() {
        let (script, mock) = script(
            " User is asking about how to save money.\nCurrent stage: Stage 1\n- Assistant: Đối với tiết kiệm thì mình có thể giúp bạn.",
        );
        let reply = script
            .advance(&ask("Mình muốn được tư vấn về vấn đề tiết kiệm"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.message, "Đối với tiết kiệm thì mình có thể giúp bạn.");
        assert_eq!(reply.suggestions.len(), 2);

        let request = &mock.requests().await[0];
        assert!(request.prompt.ends_with("- Minh: Mình muốn được tư vấn về vấn đề tiết kiệm\nAnalyzing:"));
        assert_eq!(request.stop, vec!["- Minh:".to_string()]);
    }

    #[tokio::test]
    async fn test_stage_two_asks_income() {
        let (script, _) = script(
            " User is asking about how much time it takes to save 100 million VND SET_TARGET_MONEY[100000000].\nCurrent stage: Stage 2\n- Assistant: Thu nhập hàng tháng của bạn là bao nhiêu?",
        );
        let reply = script
            .advance(&ask("Mình muốn được biết rằng trong bao lâu thì mình có thể tiết kiệm được 100 triệu đồng"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.message, "Thu nhập hàng tháng của bạn là bao nhiêu?");
        assert_eq!(reply.suggestions, vec!["5 triệu".to_string()]);
    }

    #[tokio::test]
    async fn test_stage_three_fills_placeholders() {
        let (script, _) = script(
            " User is telling their income SET_INCOME[8000000]. Recall SET_TARGET_TIME[2].\nCurrent stage: Stage 3\n- Assistant: Ok. Thì sau 2 năm bạn sẽ có {money}. {INSERT_TABLE}",
        );
        let messages = vec![
            Message::new("Minh", "Mình muốn biết nếu mình tiết kiệm 2 năm thì sẽ có bao nhiêu"),
            Message::new("assistant", "Thu nhập hàng tháng của bạn là bao nhiêu?"),
            Message::new("Minh", "8 triệu đồng"),
        ];
        let reply = script.advance(&messages).await.unwrap().unwrap();

        assert!(reply.message.starts_with("Ok. Thì sau 2 năm bạn sẽ có 20.4 triệu."));
        assert!(reply.message.contains("| 2 | 8,400,000 | 10% | 10,080,000 | 20,448,000 |"));
        assert!(reply.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_stage_three_without_placeholders_summarizes() {
        let (script, _) = script(
            " SET_INCOME[8000000] SET_TARGET_MONEY[20000000]\nCurrent stage: Stage 3\n- Assistant: Ok.",
        );
        let reply = script.advance(&ask("8 triệu đồng")).await.unwrap().unwrap();
        assert!(reply.message.contains("Thì sau khoảng 2 năm thì bạn có thể tiết kiệm được 20.0 triệu."));
    }

    #[tokio::test]
    async fn test_model_stage_overridden_by_signals() {
        // Model claims stage 3 but never captured an income
        let (script, _) = script(
            " SET_TARGET_TIME[20]\nCurrent stage: Stage 3\n- Assistant: Thì sau 20 năm bạn sẽ có {money}.",
        );
        let reply = script
            .advance(&ask("I want to know how much I will have if I save for 20 years"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.message, "What is your monthly income?");
        assert_eq!(reply.suggestions, vec!["5 million VND".to_string()]);
    }

    #[test]
    fn test_time_goal_past_cap_reports_capped_balance() {
        let table = SavingsTable::build(8_000_000.0, SavingsGoal::Years(150));
        let at_cap = SavingsTable::build(8_000_000.0, SavingsGoal::Years(MAX_YEARS));

        let english = summarize(&table, Language::English);
        assert!(!english.contains("After 150 years"));
        assert!(english.contains("up to 100 years rather than 150"));
        assert!(english.contains(&format!("After 100 years you will have {} VND.", group_thousands(at_cap.final_saved()))));

        let vietnamese = summarize(&table, Language::Vietnamese);
        assert!(!vietnamese.contains("sau 150 năm"));
        assert!(vietnamese.contains("Sau 100 năm bạn sẽ có"));

        assert_eq!(fill_placeholders("Sau {time} năm bạn sẽ có {money}.", &table), None);
    }

    #[test]
    fn test_english_summary_uses_plain_amounts() {
        let table = SavingsTable::build(8_000_000.0, SavingsGoal::Years(2));
        let english = summarize(&table, Language::English);
        assert!(english.contains("After 2 years you will have 20,448,000 VND."));
        assert!(!english.contains("triệu"));

        let amount = SavingsTable::build(8_000_000.0, SavingsGoal::Amount(20_000_000.0));
        let english = summarize(&amount, Language::English);
        assert!(english.contains("You can save 20,000,000 VND in about 2 years."));

        let short = SavingsTable::build(1_000.0, SavingsGoal::Amount(1e15));
        let english = summarize(&short, Language::English);
        assert!(!english.contains("tỷ"));
        assert!(!english.contains("triệu"));
    }

    #[tokio::test]
    async fn test_break_falls_through() {
        let (script, _) = script(" User asks about the weather.\nCurrent stage: BREAK");
        assert_eq!(script.advance(&ask("Trời hôm nay thế nào? tiết kiệm")).await.unwrap(), None);
    }
}
