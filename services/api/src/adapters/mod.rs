pub mod chat;
pub mod content_llm;
pub mod db;
pub mod feedback_llm;
pub mod image_gen;
pub mod memory;
pub mod notifier;
pub mod quiz_llm;

pub use content_llm::OpenAiContentAdapter;
pub use db::DbAdapter;
pub use feedback_llm::OpenAiFeedbackAdapter;
pub use image_gen::OpenAiImageAdapter;
pub use memory::InMemoryDb;
pub use notifier::LogResetNotifier;
pub use quiz_llm::OpenAiQuizAdapter;
