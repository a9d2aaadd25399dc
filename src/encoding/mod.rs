//! Wire-format primitives shared by every packet encoder/decoder.

pub mod string;
pub mod variable_byte_integer;

pub use string::{read_binary, read_str, write_binary, write_str};
pub use variable_byte_integer::{
    VariableByteInteger, VariableByteIntegerDecoder, VariableByteIntegerEncoder, MAX_ENCODABLE,
};
