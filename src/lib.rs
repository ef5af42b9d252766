pub mod bits;
pub mod decode;
pub mod ir;
pub mod lift;
pub mod mnemonic;
pub mod operand;
pub mod subarch;

pub use decode::{decode, Instruction};
pub use ir::{IrBuilder, IrFunction};
pub use lift::Lifter;
pub use mnemonic::Mnemonic;
pub use operand::{Operand, Reg};
pub use subarch::SubArch;
