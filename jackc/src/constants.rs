//! Names provided by the operating system library.

/// Classes implemented by the runtime, which need no source file.
pub const LIBRARY_CLASSES: [&str; 8] = [
    "Math", "String", "Array", "Output", "Screen", "Keyboard", "Memory", "Sys",
];

/// Allocates an object's fields, taking the number of words.
pub const MEMORY_ALLOC: &str = "Memory.alloc";

/// Creates a string, taking its maximum length.
pub const STRING_NEW: &str = "String.new";

/// Appends a character code to a string, returning the string.
pub const STRING_APPEND_CHAR: &str = "String.appendChar";
