pub mod chat;

pub use chat::{
    build_prompt, current_context, extend_context, ChatError, ChatModel, HttpChatModel,
};
