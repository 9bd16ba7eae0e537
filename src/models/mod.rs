pub mod author;
pub mod book;
pub mod chat;
pub mod task;

pub use author::{Author, AuthorCandidate, AuthorChanges, NewAuthor};
pub use book::{Book, BookCandidate, BookChanges, NewBook};
pub use chat::{ChatRequest, ChatResponse, Conversation, Message, MessageRole};
pub use task::{
    NewTask, Task, TaskCandidate, TaskCategory, TaskChanges, TaskPriority, TaskStatus,
};
