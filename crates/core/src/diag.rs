pub use comment_sweep_diagnostics::*;
