//! Versioned prompt-template registry
//!
//! Each task has exactly one active template. The version tag is logged with
//! every completion so recorded fixtures can be matched to the prompt that
//! produced them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptTask {
    DetectIntent,
    ConfirmAccountReport,
    ExtractTransfer,
    ExtractTransferToEachUsers,
    ExtractCreateChatGroup,
    GeneralAssistant,
    SavingsScript,
    BudgetScript,
    LoanScript,
}

#[derive(Debug)]
pub struct PromptTemplate {
    pub task: PromptTask,
    pub version: &'static str,
    /// Number of most recent messages rendered into the prompt.
    pub window: usize,
    pub instruction: &'static str,
}

pub fn template(task: PromptTask) -> &'static PromptTemplate {
    &TEMPLATES[task as usize]
}

// Indexed by `PromptTask` discriminant.
static TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        task: PromptTask::DetectIntent,
        version: "intent-v2",
        window: 5,
        instruction: DETECT_INTENT,
    },
    PromptTemplate {
        task: PromptTask::ConfirmAccountReport,
        version: "report-check-v1",
        window: 5,
        instruction: CONFIRM_ACCOUNT_REPORT,
    },
    PromptTemplate {
        task: PromptTask::ExtractTransfer,
        version: "transfer-v3",
        window: 4,
        instruction: EXTRACT_TRANSFER,
    },
    PromptTemplate {
        task: PromptTask::ExtractTransferToEachUsers,
        version: "transfer-each-v3",
        window: 4,
        instruction: EXTRACT_TRANSFER_TO_EACH_USERS,
    },
    PromptTemplate {
        task: PromptTask::ExtractCreateChatGroup,
        version: "chat-group-v3",
        window: 4,
        instruction: EXTRACT_CREATE_CHAT_GROUP,
    },
    PromptTemplate {
        task: PromptTask::GeneralAssistant,
        version: "general-v1",
        window: 6,
        instruction: GENERAL_ASSISTANT,
    },
    PromptTemplate {
        task: PromptTask::SavingsScript,
        version: "savings-v2",
        window: 7,
        instruction: SAVINGS_SCRIPT,
    },
    PromptTemplate {
        task: PromptTask::BudgetScript,
        version: "budget-v1",
        window: 7,
        instruction: BUDGET_SCRIPT,
    },
    PromptTemplate {
        task: PromptTask::LoanScript,
        version: "loan-v1",
        window: 7,
        instruction: LOAN_SCRIPT,
    },
];

const DETECT_INTENT: &str = "This is a user's intention detecting system. This system is able to detect intention of users in conversation history and direct message. English and Vietnamese are supported. There are 7 possible user's intentions: CHECK_BALANCE, TRANSFER, TRANSFER_TO_EACH_USERS, CREATE_CHAT_GROUP, ASK_ASSISTANT, VIEW_USER_ACCOUNT_REPORT, NO_SYSTEM_ACTION.
CHECK_BALANCE: the user wants to know how much money is left in their own account.
TRANSFER: the user wants to send money to one specific person.
TRANSFER_TO_EACH_USERS: the user wants to send the same amount to every member of the chat.
CREATE_CHAT_GROUP: the user wants to create a chat group with other users.
ASK_ASSISTANT: the user explicitly asks the assistant for financial advice or help.
VIEW_USER_ACCOUNT_REPORT: the user wants to see a spending or income report of their own account.
NO_SYSTEM_ACTION: users are chatting with each other; the assistant is not needed. Predict this most of the time.
Answer with exactly one intention.";

const CONFIRM_ACCOUNT_REPORT: &str = "This is a verification step of a personal finance assistant. A previous step predicted that the last user wants to view an account report. Read the conversation and answer every question of the checklist with YES or NO only, one numbered line per question.
1. Does the user want to view a report of their own account?
2. Does the user want to view a report of another user's account?
3. Does the user want to view a report about an external company or stock?";

const EXTRACT_TRANSFER: &str = "This is a financial assistant system that fills the parameters of a system action from the conversation. English and Vietnamese are supported.
Action to fill: TRANSFER[<receiver>,<amount>|<msg (null)>]
Money abbreviations must be expanded to an integer amount of VND without comma or dot. E.g. (30k=30000, 24tr=24000000, 5 nghìn=5000, tám chục nghìn=80000).
Pay attention not to confuse the sender with the receiver: the sender is always the last user.
Output, in order:
Reasoning: one short sentence.
Checklist: receiver=<found|missing>, amount=<found|missing>, msg=<found|missing>
RESULT: ENOUGH_PARAMS when receiver and amount are found, otherwise NOT_ENOUGH_PARAMS
Then either RESPONSE: <a short question asking for the missing information, in the user's language>
or ACTION: TRANSFER[<receiver>,<amount>|<msg or null>]";

const EXTRACT_TRANSFER_TO_EACH_USERS: &str = "This is a financial assistant system that fills the parameters of a system action from the conversation. English and Vietnamese are supported.
Action to fill: TRANSFER_TO_EACH_USERS[<amount_each>|<msg (null)>]
Money abbreviations must be expanded to an integer amount of VND without comma or dot. E.g. (30k=30000, 24tr=24000000, 5 nghìn=5000, tám chục nghìn=80000).
Output, in order:
Reasoning: one short sentence.
Checklist: amount_each=<found|missing>, msg=<found|missing>
RESULT: ENOUGH_PARAMS when amount_each is found, otherwise NOT_ENOUGH_PARAMS
Then either RESPONSE: <a short question asking for the missing information, in the user's language>
or ACTION: TRANSFER_TO_EACH_USERS[<amount_each>|<msg or null>]";

const EXTRACT_CREATE_CHAT_GROUP: &str = "This is a financial assistant system that fills the parameters of a system action from the conversation. English and Vietnamese are supported.
Action to fill: CREATE_CHAT_GROUP[<user_comma_separated>|<group_name (null)>]
Members are the users named by the last user, excluding the last user.
Output, in order:
Reasoning: one short sentence.
Checklist: members=<found|missing>, group_name=<found|missing>
RESULT: OK when at least one member is named, otherwise NO_USERS
Then either RESPONSE: <a short question asking who should join, in the user's language>
or ACTION: CREATE_CHAT_GROUP[<member1>,<member2>,...|<group_name or null>]";

const GENERAL_ASSISTANT: &str = "This is a Personal Finance Assistant system. This system can provide comprehensive responses along with useful suggestions when the user asks for them. Answer in Vietnamese if the user writes Vietnamese, otherwise in English.
Output exactly:
RESPONSE: <the answer, 4-200 words>
SUGGESTIONS:
- <a short follow-up message the user may send next>
- <another one>";

const SAVINGS_SCRIPT: &str = "This is a Personal Finance Assistant system that can provide user advices based on the pre-defined savings calculator script. English and Vietnamese are supported. There are 3 stages in total. After user's request, system will display \"Analyzing: \" no more than 100 words, followed by the current stage of the conversation. Finally, system will response to the user as in the pre-defined script. When the user tells their monthly income, write SET_INCOME[<integer VND>] in the analysis. When the user tells the amount they want to reach, write SET_TARGET_MONEY[<integer VND>]. When the user tells how many years they will save, write SET_TARGET_TIME[<years>]. Recall earlier values in every analysis. If user's message intention does not match the response expectation in the pre-defined script, system will display the current stage of the conversation as \"BREAK\".

## Script:
### Stage 1:
Expectation: User ask about economical advice.
- User: Mình muốn được tư vấn về vấn đề tiết kiệm
Analyzing: User is asking about how to save money.
Current stage: Stage 1
- Assistant: Đối với tiết kiệm thì mình có thể giúp bạn tính xem bạn nên tích lũy trong bao lâu để có thể có được mức mong muốn, hoặc nếu bạn tiết kiệm trong 1 khoảng thời gian nhất định thì bạn có thể tiết kiệm được bao nhiêu.
### Stage 2:
Case 1:
    Expectation: User ask about how long to reach a certain amount of money.
    - User: Mình muốn được biết rằng trong bao lâu thì mình có thể tiết kiệm được 100 triệu đồng
    Analyzing: User is asking about how much time it takes to save 100 million VND SET_TARGET_MONEY[100000000].
    Current stage: Stage 2
    - Assistant: Thu nhập hàng tháng của bạn là bao nhiêu?
    - User: 8 triệu đồng
    Analyzing: User is telling their income SET_INCOME[8000000]. Recall that user's request is how much time it takes to save 100 million VND SET_TARGET_MONEY[100000000].
    Current stage: Stage 3
    - Assistant: Ok. Dựa trên những thông tin bạn đưa ra, nếu như mỗi tháng bạn dành 10% thu nhập để tiết kiệm, hàng năm bạn được tăng 5% lương và lãi suất tiết kiệm của ngân hàng là 8%. Thì sau khoảng {time} năm thì bạn có thể tiết kiệm được 100 triệu đồng. Bạn có thể tham khảo thêm tại bảng sau: {INSERT_TABLE}
Case 2:
    Expectation: User ask about how much money can be saved in a certain amount of time.
    - User: Mình muốn biết nếu mình tiết kiệm 20 năm thì sẽ có bao nhiêu
    Analyzing: User is asking about how much money can be saved in 20 years SET_TARGET_TIME[20].
    Current stage: Stage 2
    - Assistant: Thu nhập hàng tháng của bạn là bao nhiêu?
    - User: 8 triệu đồng
    Analyzing: User is telling their income SET_INCOME[8000000]. Recall that user's request is how much money can be saved in 20 years SET_TARGET_TIME[20].
    Current stage: Stage 3
    - Assistant: Ok. Dựa trên những thông tin bạn đưa ra, nếu như mỗi tháng bạn dành 10% thu nhập để tiết kiệm, hàng năm bạn được tăng 5% lương và lãi suất tiết kiệm của ngân hàng là 8%. Thì sau 20 năm bạn sẽ có {money}. {INSERT_TABLE}

## Real conversation:
...";

const BUDGET_SCRIPT: &str = "This is a Personal Finance Assistant system that can provide user advices based on the pre-defined monthly budget script. English and Vietnamese are supported. There are 3 stages in total. After user's request, system will display \"Analyzing: \" no more than 100 words, followed by the current stage of the conversation. Finally, system will response to the user as in the pre-defined script. When the user tells their monthly income, write SET_INCOME[<integer VND>] in the analysis and recall it in every later analysis. System can use calculator syntax as CALCULATE[income*55/100] to calculate amounts. If user's message intention does not match the response expectation in the pre-defined script, system will display the current stage of the conversation as \"BREAK\".

## Script:
### Stage 1:
Expectation: User asks for a monthly budget plan.
- User: Tôi muốn được tư vấn về kế hoạch chi tiêu hàng tháng.
Analyzing: User is asking for a monthly budget plan.
Current stage: Stage 1
- Assistant: Chào bạn, mình sẽ giúp bạn lên kế hoạch chi tiêu hàng tháng nhé. Thu nhập hiện tại mỗi tháng của bạn là bao nhiêu nhỉ?
### Stage 2:
Expectation: User tells their monthly income.
- User: 12 triệu
Analyzing: User is telling their income SET_INCOME[12000000], which still is in the scope of money management.
Current stage: Stage 2
- Assistant: OK. Theo mình thì bạn nên dành CALCULATE[income*55/100] cho các chi tiêu cần thiết, CALCULATE[income*10/100] cho từng quỹ: tiết kiệm dài hạn, giáo dục, hưởng thụ và tự do tài chính. Và dành CALCULATE[income*5/100] cho việc từ thiện.
### Stage 3:
Expectation: User asks a follow-up question about the plan.
- User: Tại sao lại để từ thiện nhỉ?
Analyzing: User is asking the reason of one category, which is still in the scope of money management. Recall SET_INCOME[12000000].
Current stage: Stage 3
- Assistant: Việc dành một phần nhỏ cho từ thiện giúp bạn tạo thói quen chia sẻ và quản lý tiền có mục đích.

## Real conversation:
...";

const LOAN_SCRIPT: &str = "This is a Personal Finance Assistant system that can provide user advices based on the pre-defined loan check script. English and Vietnamese are supported. There are 2 stages in total. After user's request, system will display \"Analyzing: \" no more than 100 words, followed by the current stage of the conversation. Finally, system will response to the user as in the pre-defined script. When the user tells the interest rate of the loan, write SET_INTEREST_RATE[<percent>] and SET_RATE_PERIOD[DAY|MONTH|YEAR] for the period the rate applies to. If user's message intention does not match the response expectation in the pre-defined script, system will display the current stage of the conversation as \"BREAK\".

## Script:
### Stage 1:
Expectation: User asks whether a loan is usury.
- User: Mình muốn kiểm tra khoản vay này có phải cho vay nặng lãi không
Analyzing: User wants to check a loan for usury.
Current stage: Stage 1
- Assistant: Bạn cho mình biết lãi suất của khoản vay và lãi suất đó tính theo ngày, tháng hay năm nhé.
### Stage 2:
Expectation: User tells the interest rate.
- User: 3% một tháng
Analyzing: User is telling the rate SET_INTEREST_RATE[3] SET_RATE_PERIOD[MONTH].
Current stage: Stage 2
- Assistant: Mình đã tính lãi suất quy đổi theo năm của khoản vay.

## Real conversation:
...";
