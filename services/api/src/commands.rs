use crate::infra::parse_date;
use chrono::NaiveDate;
use clap::Args;
use lien_ledger::config::AppConfig;
use lien_ledger::error::AppError;
use lien_ledger::store::SqliteStore;
use lien_ledger::workflows::deadlines::{
    calculate, plan_project_deadlines, DeadlineCalculation, DeadlinePlan, DeadlineRepository,
    DeadlineType, LienRuleTable, ProjectType,
};

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    /// Deadline type, e.g. mechanics_lien or preliminary_notice
    #[arg(long = "type")]
    pub(crate) deadline_type: DeadlineType,
    /// Date the statutory countdown starts (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) trigger_date: NaiveDate,
    /// private or public
    #[arg(long, default_value_t = ProjectType::Private)]
    pub(crate) project_type: ProjectType,
}

#[derive(Args, Debug)]
pub(crate) struct PlanArgs {
    /// private or public
    #[arg(long, default_value_t = ProjectType::Private)]
    pub(crate) project_type: ProjectType,
    /// First day labor or materials were furnished (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) work_start: Option<NaiveDate>,
    /// Completion date of the work (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) work_end: Option<NaiveDate>,
}

/// Rules stored in the configured database, or the standard set when it has none.
fn load_rules() -> Result<LienRuleTable, AppError> {
    let config = AppConfig::load()?;
    let store = SqliteStore::connect(&config.database)?;
    let rules = store.lien_rules()?;
    if rules.is_empty() {
        return Ok(LienRuleTable::standard());
    }
    Ok(LienRuleTable::from_rules(rules))
}

pub(crate) fn run_rules() -> Result<(), AppError> {
    let table = load_rules()?;
    print!("{}", render_rules(&table));
    Ok(())
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let table = load_rules()?;
    let calculation = calculate(
        &table,
        args.deadline_type,
        args.trigger_date,
        args.project_type,
    )?;
    print!("{}", render_calculation(&calculation));
    Ok(())
}

pub(crate) fn run_plan(args: PlanArgs) -> Result<(), AppError> {
    let table = load_rules()?;
    let plans = plan_project_deadlines(&table, args.project_type, args.work_start, args.work_end)?;
    print!("{}", render_plan(args.project_type, &plans));
    Ok(())
}

fn render_rules(table: &LienRuleTable) -> String {
    let mut out = format!("Lien rules ({})\n", table.len());
    for rule in table.rules() {
        out.push_str(&format!(
            "- {:<20} {:<8} {:>4} days from {:<16} {}\n",
            rule.rule_type.as_str(),
            rule.project_type.as_str(),
            rule.deadline_days,
            rule.trigger_event.as_str(),
            rule.statutory_reference
        ));
    }
    out
}

fn render_calculation(calculation: &DeadlineCalculation) -> String {
    format!(
        "{} ({})\n  trigger:  {} ({})\n  deadline: {} (+{} days)\n  {}\n  ref: {}\n",
        calculation.deadline_type.title(),
        calculation.project_type,
        calculation.trigger_date,
        calculation.trigger_event,
        calculation.deadline_date,
        calculation.deadline_days,
        calculation.description,
        calculation.statutory_reference
    )
}

fn render_plan(project_type: ProjectType, plans: &[DeadlinePlan]) -> String {
    if plans.is_empty() {
        return format!("No statutory deadlines apply to this {project_type} project window.\n");
    }

    let mut out = format!("Planned deadlines for {project_type} project\n");
    for plan in plans {
        out.push_str(&format!(
            "- {} on {} [{}] from {}\n",
            plan.title, plan.deadline_date, plan.priority, plan.trigger_date
        ));
    }
    out
}
