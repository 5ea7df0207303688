use std::path::Path;

use crate::error::Result;
use crate::paths;
use crate::platform::types::AutomationHandle;
use crate::platform::Automation;

/// Find a running IDE instance bound to `target`.
///
/// With `target` of `None`, only an instance with no solution open matches.
/// Objects that cannot be described are skipped. The first match of a single
/// pass over the registry wins.
pub async fn find_instance(
    automation: &dyn Automation,
    product_name: &str,
    target: Option<&Path>,
) -> Result<Option<AutomationHandle>> {
    let instances = automation.running_instances().await?;

    for instance in instances {
        let description = match automation.describe(&instance).await {
            Ok(description) => description,
            Err(e) => {
                tracing::debug!(instance = %instance, error = %e, "Skipping running object");
                continue;
            }
        };

        if description.product_name != product_name {
            continue;
        }

        let matches = match (&description.open_solution, target) {
            (None, None) => true,
            (Some(open), Some(target)) => paths::eq_ignore_case(open, target),
            _ => false,
        };

        if matches {
            tracing::debug!(instance = %instance, "Found IDE instance");
            return Ok(Some(AutomationHandle {
                instance,
                description,
            }));
        }
    }

    Ok(None)
}
