use antecedent_core::{ClaimReport, ClaimStatus, OwnershipStatus, ResourceId};
use colored::Colorize;
use serde_json::Value;

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_status(status: &OwnershipStatus, expected: &ResourceId) {
    match status {
        OwnershipStatus::Unclaimed => {
            print_success(&format!("Unclaimed; {} may adopt these resources", expected.to_string().cyan()));
        }
        OwnershipStatus::Claimed {
            owner,
            matches_expected: true,
            resource,
        } => {
            print_success(&format!("Owned by {} (first claimed: {resource})", owner.cyan()));
        }
        OwnershipStatus::Claimed {
            owner, resource, ..
        } => {
            print_error(&format!(
                "Owned by {} (first claimed: {resource}), not {}",
                owner.yellow(),
                expected.to_string().cyan()
            ));
        }
    }
}

pub fn print_report(report: &ClaimReport) {
    for outcome in report.outcomes() {
        match &outcome.status {
            ClaimStatus::Annotated => println!("  {} {}", "✓".green(), outcome.resource),
            ClaimStatus::Unresolved { gvk } => println!(
                "  {} {} {}",
                "✗".red(),
                outcome.resource,
                format!("(kind not served: {gvk})").dimmed()
            ),
            ClaimStatus::Unnamed => println!(
                "  {} {} {}",
                "✗".red(),
                outcome.resource,
                "(no metadata.name)".dimmed()
            ),
            ClaimStatus::PatchFailed(err) => println!(
                "  {} {} {}",
                "✗".red(),
                outcome.resource,
                format!("({err})").dimmed()
            ),
        }
    }

    let annotated = report.annotated().count();
    let failed = report.failures().count();
    if failed == 0 {
        print_success(&format!("Annotated {annotated} resource(s)"));
    } else {
        print_error(&format!("Annotated {annotated} resource(s), {failed} failed"));
    }
}
