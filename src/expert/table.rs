//! Savings table
//!
//! Fixed assumptions: 10% of monthly income saved, income grows 5% a year,
//! the bank pays 8% a year on the cumulative balance.
//!
//! year 1:  income₁ = income, saved₁ = income₁·0.10·12
//! year i:  incomeᵢ = incomeᵢ₋₁·1.05
//!          savedᵢ  = savedᵢ₋₁ + incomeᵢ·0.10·12 + interestᵢ₋₁
//! every year: interestᵢ = savedᵢ·0.08

use super::calculator::group_thousands;

pub const MONTHLY_SAVING_RATE: f64 = 0.10;
pub const INCOME_GROWTH: f64 = 1.05;
pub const BANK_INTEREST: f64 = 0.08;
pub const MAX_YEARS: u32 = 100;

const HEADER: &str = "| Số năm | Thu nhập | % tiết kiệm mỗi tháng | Lượng tiết kiệm mỗi năm | Tổng lượng tiết kiệm | Lãi suất tiết kiệm của ngân hàng |";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SavingsGoal {
    /// Save for this many years.
    Years(u32),
    /// Save until the balance reaches this amount.
    Amount(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsRow {
    pub year: u32,
    pub income: f64,
    pub yearly_saving: f64,
    pub total_saved: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavingsTable {
    pub rows: Vec<SavingsRow>,
    pub goal: SavingsGoal,
}

impl SavingsTable {
    pub fn build(monthly_income: f64, goal: SavingsGoal) -> Self {
        let mut rows: Vec<SavingsRow> = Vec::new();

        for year in 1..=MAX_YEARS {
            let row = match rows.last() {
                None => {
                    let yearly_saving = monthly_income * MONTHLY_SAVING_RATE * 12.0;
                    SavingsRow {
                        year,
                        income: monthly_income,
                        yearly_saving,
                        total_saved: yearly_saving,
                        interest: yearly_saving * BANK_INTEREST,
                    }
                }
                Some(previous) => {
                    let income = previous.income * INCOME_GROWTH;
                    let yearly_saving = income * MONTHLY_SAVING_RATE * 12.0;
                    let total_saved = previous.total_saved + yearly_saving + previous.interest;
                    SavingsRow {
                        year,
                        income,
                        yearly_saving,
                        total_saved,
                        interest: total_saved * BANK_INTEREST,
                    }
                }
            };
            rows.push(row);

            let done = match goal {
                SavingsGoal::Years(years) => year >= years,
                SavingsGoal::Amount(target) => row.total_saved >= target,
            };
            if done {
                break;
            }
        }

        Self { rows, goal }
    }

    pub fn years(&self) -> u32 {
        self.rows.last().map_or(0, |row| row.year)
    }

    pub fn final_saved(&self) -> f64 {
        self.rows.last().map_or(0.0, |row| row.total_saved)
    }

    /// False when the goal lies beyond `MAX_YEARS`.
    pub fn reached_goal(&self) -> bool {
        match self.goal {
            SavingsGoal::Years(years) => self.years() >= years,
            SavingsGoal::Amount(target) => self.final_saved() >= target,
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from(HEADER);
        out.push_str("\n|---|---|---|---|---|---|");
        for row in &self.rows {
            out.push_str(&format!(
                "\n| {} | {} | {:.0}% | {} | {} | {} |",
                row.year,
                group_thousands(row.income),
                MONTHLY_SAVING_RATE * 100.0,
                group_thousands(row.yearly_saving),
                group_thousands(row.total_saved),
                group_thousands(row.interest),
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_one_year_base_case() {
        let table = SavingsTable::build(8_000_000.0, SavingsGoal::Years(1));
        assert_eq!(table.years(), 1);
        assert!(close(table.final_saved(), 9_600_000.0));
        assert!(close(table.rows[0].interest, 768_000.0));
    }

    #[test]
    fn test_second_year_compounds_income_and_interest() {
        let table = SavingsTable::build(8_000_000.0, SavingsGoal::Years(2));
        let second = table.rows[1];
        assert!(close(second.income, 8_400_000.0));
        assert!(close(second.yearly_saving, 10_080_000.0));
        // 9.6M + 10.08M + 0.768M
        assert!(close(second.total_saved, 20_448_000.0));
    }

    #[test]
    fn test_income_grows_from_last_year_not_original() {
        let table = SavingsTable::build(8_000_000.0, SavingsGoal::Years(3));
        assert!(close(table.rows[2].income, 8_000_000.0 * 1.05 * 1.05));
    }

    #[test]
    fn test_amount_goal_stops_at_first_year_reaching_target() {
        let table = SavingsTable::build(8_000_000.0, SavingsGoal::Amount(20_000_000.0));
        assert_eq!(table.years(), 2);
        assert!(table.reached_goal());

        let exact = SavingsTable::build(8_000_000.0, SavingsGoal::Amount(9_600_000.0));
        assert_eq!(exact.years(), 1);
    }

    #[test]
    fn test_unreachable_amount_is_bounded() {
        let table = SavingsTable::build(1_000.0, SavingsGoal::Amount(1e15));
        assert_eq!(table.years(), MAX_YEARS);
        assert!(!table.reached_goal());
    }

    #[test]
    fn test_zero_years_still_yields_first_row() {
        let table = SavingsTable::build(5_000_000.0, SavingsGoal::Years(0));
        assert_eq!(table.years(), 1);
        assert!(table.reached_goal());
    }

    #[test]
    fn test_time_goal_past_cap_is_not_reached() {
        let capped = SavingsTable::build(8_000_000.0, SavingsGoal::Years(150));
        assert_eq!(capped.rows.len(), MAX_YEARS as usize);
        assert!(!capped.reached_goal());

        let at_cap = SavingsTable::build(8_000_000.0, SavingsGoal::Years(MAX_YEARS));
        assert!(at_cap.reached_goal());
    }

    #[test]
    fn test_markdown_layout() {
        let markdown = SavingsTable::build(8_000_000.0, SavingsGoal::Years(2)).to_markdown();
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[2], "| 1 | 8,000,000 | 10% | 9,600,000 | 9,600,000 | 768,000 |");
        assert_eq!(lines[3], "| 2 | 8,400,000 | 10% | 10,080,000 | 20,448,000 | 1,635,840 |");
    }
}
