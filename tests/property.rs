#[path = "property/scheduler.rs"]
mod scheduler;
