use anyhow::Result;
use inquire::Confirm;

use srt_core::Requirement;

/// Asks before minting work items; answering no sends `confirm = false`
pub fn confirm_create_items(br_id: &str, requirement: Option<&Requirement>) -> Result<bool> {
    let message = match requirement {
        Some(req) => format!(
            "Create BusinessRequirement, Epic and Feature items for {} ({})?",
            br_id, req.title
        ),
        None => format!(
            "{} is not a business requirement in this template. Create work items anyway?",
            br_id
        ),
    };

    let confirmed = Confirm::new(&message)
        .with_default(false)
        .with_help_message("Work items are created in the tracker and cannot be undone here")
        .prompt()?;

    Ok(confirmed)
}
