mod force_kernel;
mod neighbour_list;
mod pipe_array;

pub use force_kernel::*;
pub use neighbour_list::*;
pub use pipe_array::*;
