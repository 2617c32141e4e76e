//! Monthly budget script (six-jar split)
//!
//! Stage 1: ask for monthly income
//! Stage 2: allocate 55/10/10/10/10/5 through CALCULATE expressions
//! Stage 3: follow-up questions about the plan

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::calculator::evaluate_calculations;
use super::signals::Signals;
use super::{mentions_any, run_script, ExpertScript, ScriptReply, Stage};
use crate::completion::CompletionClient;
use crate::lang::Language;
use crate::models::Message;
use crate::prompt::PromptTask;
use crate::Result;

const TOPICS: &[&str] = &[
    "kế hoạch chi tiêu",
    "quản lý tài chính",
    "ngân sách",
    "budget",
    "money management",
];
const STAGES: u8 = 3;

const ALLOCATION_VI: &str = "OK. Theo mình thì bạn nên dành CALCULATE[income*55/100] cho các chi tiêu cần thiết, CALCULATE[income*10/100] cho từng quỹ: tiết kiệm dài hạn, giáo dục, hưởng thụ và tự do tài chính. Và dành CALCULATE[income*5/100] cho việc từ thiện.";
const ALLOCATION_EN: &str = "OK. I suggest spending CALCULATE[income*55/100] on necessities, CALCULATE[income*10/100] on each of these funds: long-term savings, education, play and financial freedom. And CALCULATE[income*5/100] on giving.";

pub struct BudgetScript {
    client: Arc<dyn CompletionClient>,
}

impl BudgetScript {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

/// Transition function. Both later stages need the income; the model's
/// label only separates the allocation from follow-up questions.
pub fn budget_stage(signals: &Signals, model_stage: Stage) -> u8 {
    match (signals.income.is_some(), model_stage) {
        (false, _) => 1,
        (true, Stage::Numbered(n)) if n >= 3 => 3,
        (true, _) => 2,
    }
}

fn income_question(language: Language) -> &'static str {
    language.pick(
        "Chào bạn, mình sẽ giúp bạn lên kế hoạch chi tiêu hàng tháng nhé. Thu nhập hiện tại mỗi tháng của bạn là bao nhiêu nhỉ?",
        "Sure, I will help you plan your monthly budget. What is your current monthly income?",
    )
}

fn income_suggestions(language: Language) -> Vec<String> {
    vec![language.pick("12 triệu", "12 million VND").to_string()]
}

fn follow_up_suggestions(language: Language) -> Vec<String> {
    match language {
        Language::Vietnamese => vec![
            "Tại sao lại để từ thiện nhỉ?".to_string(),
            "Tại sao lại dành 55% cho chi tiêu cần thiết?".to_string(),
        ],
        Language::English => vec![
            "Why should I set money aside for giving?".to_string(),
            "Why spend 55% on necessities?".to_string(),
        ],
    }
}

#[async_trait]
impl ExpertScript for BudgetScript {
    fn name(&self) -> &'static str {
        "budget"
    }

    fn handles(&self, text: &str) -> bool {
        mentions_any(text, TOPICS)
    }

    async fn advance(&self, messages: &[Message]) -> Result<Option<ScriptReply>> {
        let run = run_script(self.client.as_ref(), PromptTask::BudgetScript, STAGES, messages).await?;
        if run.model_stage == Stage::Break {
            info!(script = self.name(), "Script broke off");
            return Ok(None);
        }

        let stage = budget_stage(&run.signals, run.model_stage);
        let agrees = run.agrees_with(self.name(), stage);
        let language = run.language;
        let income = run.signals.income;

        let reply = match stage {
            1 => ScriptReply::new(
                if agrees { run.reply } else { income_question(language).to_string() },
                income_suggestions(language),
            ),
            2 => {
                let text = if agrees && run.reply.contains("CALCULATE[") {
                    run.reply
                } else {
                    language.pick(ALLOCATION_VI, ALLOCATION_EN).to_string()
                };
                ScriptReply::new(evaluate_calculations(&text, income), follow_up_suggestions(language))
            }
            _ => ScriptReply::new(evaluate_calculations(&run.reply, income), Vec::new()),
        };

        Ok(Some(reply))
    }
}
