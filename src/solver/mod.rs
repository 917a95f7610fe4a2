//! Linear SVM solver implementations
//!
//! This module implements the dual coordinate descent method for L2-regularized
//! linear SVMs (Hsieh et al., "A Dual Coordinate Descent Method for Large-scale
//! Linear SVM"), the algorithm behind LIBLINEAR's default solver.

pub mod dual_cd;

pub use self::dual_cd::*;
