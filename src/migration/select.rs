use crate::error::{AppError, Result};
use crate::platform::types::UiItemId;
use crate::platform::IdeSession;

/// Select a solution explorer node by walking its path from the root.
///
/// Each node on the way is selected, and expanded when it has children or
/// is a solution folder, so that the next segment becomes reachable. The
/// final node is left selected.
pub async fn select_tree_path(session: &dyn IdeSession, path: &[String]) -> Result<UiItemId> {
    let mut current: Option<UiItemId> = None;

    for segment in path {
        let item = match &current {
            None => session.root_item(segment).await?,
            Some(parent) => session.child_item(parent, segment).await?,
        };

        session.select_item(&item).await?;

        let state = session.item_state(&item).await?;
        if state.child_count > 0 || state.is_solution_folder {
            session.expand_item(&item).await?;
        }

        current = Some(item);
    }

    current.ok_or_else(|| AppError::Automation("Empty solution explorer path".to_string()))
}
