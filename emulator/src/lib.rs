pub mod constants;
pub mod disassembler;
pub mod parser;
pub mod runtime;
pub mod search;
pub mod topology;

pub use self::{
    parser::{parse, parse_with_delimiter},
    runtime::Computer,
};
