//! Tolerant scanner for gox source.
//!
//! The scanner never stops: every lexical problem is reported through
//! the error handler and a best-effort token is produced in its place,
//! so the parser always sees a terminated token stream. Semicolons are
//! inserted automatically at line ends after tokens that can end a
//! statement; inserted semicolons carry the literal `"\n"`, written
//! ones `";"`.

mod scanner;

pub use scanner::{error_list_handler, ErrorHandler, Mode, Scanner};
