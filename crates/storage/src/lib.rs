pub mod registry;
pub mod state;
pub mod task_store;

pub use registry::ClientRegistry;
pub use state::CoordinatorState;
pub use task_store::TaskStore;
