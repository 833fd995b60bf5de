//! comp-runner: headless runner for the compensation engine.
//!
//! Usage:
//!   comp-runner --db comp.db --month 3 --year 2024
//!   comp-runner --db comp.db --ipc-mode

use anyhow::{Context, Result};
use commission_core::{
    command::Command,
    config::CompConfig,
    engine::CompEngine,
    store::CompStore,
    types::{EmployeeId, Period, Seq, TeamId},
};
use std::env;
use std::io::{self, BufRead, Write};

/// Read-only requests accepted next to commands on the IPC channel.
#[derive(serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Query {
    GetCommissions {
        period: Period,
    },
    ListProjects {
        #[serde(default)]
        employee_id: Option<EmployeeId>,
        #[serde(default)]
        period:      Option<Period>,
    },
    ListTargets {
        period: Period,
    },
    GetBudget {
        period: Period,
    },
    ListBudgets,
    TeamMembers {
        team_id: TeamId,
    },
    Scores {
        employee_id: EmployeeId,
        period:      Period,
    },
    Events {
        seq: Seq,
    },
    Quit,
}

const QUERY_NAMES: [&str; 9] = [
    "get_commissions",
    "list_projects",
    "list_targets",
    "get_budget",
    "list_budgets",
    "team_members",
    "scores",
    "events",
    "quit",
];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let month = parse_arg(&args, "--month", 0u32);
    let year = parse_arg(&args, "--year", 0i32);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    let config = CompConfig::load(data_dir)?;
    let store = CompStore::open(db).with_context(|| format!("cannot open database {db}"))?;
    store.migrate()?;
    let mut engine = CompEngine::build(store, config)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        let period = Period::new(month, year)
            .context("summary mode needs --month 1-12 and --year")?;
        println!("comp-runner");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!("  period:    {period}");
        println!();
        print_summary(&mut engine, period)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut CompEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let reply = match handle_line(engine, &buffer) {
            Ok(Some(reply)) => reply,
            Ok(None) => break,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

/// Handle one request line. `None` means the client asked to quit.
fn handle_line(engine: &mut CompEngine, line: &str) -> Result<Option<serde_json::Value>> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    let is_query = value["cmd"]
        .as_str()
        .is_some_and(|name| QUERY_NAMES.contains(&name));

    if !is_query {
        let command: Command = serde_json::from_value(value)?;
        let events = engine.execute(command)?;
        return Ok(Some(serde_json::json!({
            "seq": engine.clock.current_seq,
            "events": events,
        })));
    }

    let store = engine.store();
    let reply = match serde_json::from_value::<Query>(value)? {
        Query::Quit => return Ok(None),
        Query::GetCommissions { period } => {
            serde_json::to_value(store.commissions_for_period(period.validated()?)?)?
        }
        Query::ListProjects { employee_id, period } => {
            let period = period.map(Period::validated).transpose()?;
            serde_json::to_value(store.list_projects(employee_id, period)?)?
        }
        Query::ListTargets { period } => {
            serde_json::to_value(store.targets_for_period(period.validated()?)?)?
        }
        Query::GetBudget { period } => {
            serde_json::to_value(store.get_budget(period.validated()?)?)?
        }
        Query::ListBudgets => serde_json::to_value(store.list_budgets()?)?,
        Query::TeamMembers { team_id } => serde_json::to_value(store.team_members(team_id)?)?,
        Query::Scores { employee_id, period } => {
            serde_json::to_value(store.scores_for(employee_id, period.validated()?)?)?
        }
        Query::Events { seq } => serde_json::to_value(store.events_for_seq(seq)?)?,
    };
    Ok(Some(reply))
}

fn print_summary(engine: &mut CompEngine, period: Period) -> Result<()> {
    let rows = engine.calculate_commissions(period, Vec::new())?;
    let store = engine.store();

    println!("=== COMMISSION SUMMARY {period} ===");
    if rows.is_empty() {
        println!("  (No active employees)");
        return Ok(());
    }

    println!(
        "  {:<24} {:<14} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "employee", "role", "base", "marketing", "bonus", "commission", "total"
    );
    let mut base = 0.0;
    let mut marketing = 0.0;
    let mut bonus = 0.0;
    let mut commission = 0.0;
    let mut total = 0.0;
    for row in &rows {
        let Some(employee) = store.get_employee(row.employee_id)? else {
            continue;
        };
        println!(
            "  {:<24} {:<14} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
            employee.name,
            employee.role,
            row.base_commission,
            row.marketing_deduction,
            row.performance_bonus,
            row.final_commission,
            row.total_salary
        );
        base += row.base_commission;
        marketing += row.marketing_deduction;
        bonus += row.performance_bonus;
        commission += row.final_commission;
        total += row.total_salary;
    }
    println!();
    println!(
        "  {:<24} {:<14} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
        "TOTAL", "", base, marketing, bonus, commission, total
    );

    if let Some(budget) = store.get_budget(period)? {
        println!();
        println!(
            "  marketing budget: {:.2} allocated of {:.2} ({:.2} remaining)",
            budget.allocated_budget, budget.total_budget, budget.remaining_budget
        );
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use commission_core::types::Role;

    fn ask(engine: &mut CompEngine, line: &str) -> serde_json::Value {
        handle_line(engine, line).unwrap().unwrap()
    }

    #[test]
    fn every_query_name_parses_as_a_query() {
        let mut engine = CompEngine::build_test().unwrap();
        let team = engine.create_team("North", None).unwrap();
        let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, Some(team)).unwrap();
        let lines = [
            r#"{"cmd":"get_commissions","period":{"month":3,"year":2024}}"#.to_string(),
            r#"{"cmd":"list_projects"}"#.to_string(),
            r#"{"cmd":"list_targets","period":{"month":3,"year":2024}}"#.to_string(),
            r#"{"cmd":"get_budget","period":{"month":3,"year":2024}}"#.to_string(),
            r#"{"cmd":"list_budgets"}"#.to_string(),
            format!(r#"{{"cmd":"team_members","team_id":{team}}}"#),
            format!(r#"{{"cmd":"scores","employee_id":{rep},"period":{{"month":3,"year":2024}}}}"#),
            r#"{"cmd":"events","seq":1}"#.to_string(),
        ];
        let seq_before = engine.clock.current_seq;
        for line in &lines {
            ask(&mut engine, line);
        }
        assert_eq!(engine.clock.current_seq, seq_before);
        assert!(handle_line(&mut engine, r#"{"cmd":"quit"}"#).unwrap().is_none());
    }

    #[test]
    fn membership_budget_and_score_queries_return_rows() {
        let mut engine = CompEngine::build_test().unwrap();
        let march = Period::new(3, 2024).unwrap();
        let team = engine.create_team("North", None).unwrap();
        let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, Some(team)).unwrap();
        let kpi = engine.create_kpi("quality", 0.5, 10.0).unwrap();
        engine.record_score(rep, kpi, march, 6.0).unwrap();
        engine.set_marketing_budget(march, 1_200.0).unwrap();

        let members = ask(&mut engine, &format!(r#"{{"cmd":"team_members","team_id":{team}}}"#));
        assert_eq!(members, serde_json::json!([rep]));

        let budgets = ask(&mut engine, r#"{"cmd":"list_budgets"}"#);
        assert_eq!(budgets.as_array().map(Vec::len), Some(1));
        assert_eq!(budgets[0]["total_budget"], 1_200.0);

        let scores = ask(
            &mut engine,
            &format!(r#"{{"cmd":"scores","employee_id":{rep},"period":{{"month":3,"year":2024}}}}"#),
        );
        assert_eq!(scores[0]["weighted_score"], 3.0);
    }

    #[test]
    fn unknown_names_fall_through_to_commands() {
        let mut engine = CompEngine::build_test().unwrap();
        let reply = ask(&mut engine, r#"{"cmd":"create_team","name":"South"}"#);
        assert_eq!(reply["events"][0]["type"], "team_created");
    }
}
