use tokio::time::Instant;

/// Sleep until `deadline`, or forever when there is none. Used as a
/// `select!` arm for optional one-shot timers.
pub(crate) async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
