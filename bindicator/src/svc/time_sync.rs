/// Network time synchronization.
pub trait TimeSync {
    /// Blocks until the wall clock has been set, or fails.
    fn sync(&self) -> anyhow::Result<()>;
}
