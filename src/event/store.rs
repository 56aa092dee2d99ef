use crate::event::db::DbEvent;

pub trait EventStore {
    /// Append the event to the log, returning the next sequence number
    fn add_event(&self, event: &DbEvent) -> anyhow::Result<u32>;

    /// Get the event with the given sequence number
    fn get_event(&self, seq_num: u32) -> anyhow::Result<Option<DbEvent>>;

    /// Next sequence number to be assigned
    fn get_next_seq_num(&self) -> anyhow::Result<u32>;

    /// All events in sequence order
    fn get_event_log(&self) -> anyhow::Result<Vec<DbEvent>>;
}
