mod bank;
mod chat;
mod ids;
mod question;
mod student;

pub use ids::{MessageId, ParseIdError, QuestionId, StudentId};

pub use bank::{BankError, QuestionBank};
pub use chat::{ChatMessage, ChatRole};
pub use question::{Question, QuestionDraft, QuestionError, Subject};
pub use student::Student;
