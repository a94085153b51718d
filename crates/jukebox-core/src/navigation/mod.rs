// ── View navigation ──
//
// Stack-based modal navigation with a timed volume overlay and a
// terminal Shutdown view.

mod navigator;
mod view;

pub use navigator::{
    Navigable, NavigationOutcome, NavigationSnapshot, NavigatorEvents, ViewNavigator,
};
pub(crate) use navigator::NavRequest;
pub use view::{InputTarget, NavigationEntry, NavigationStack, ViewIdentity};
