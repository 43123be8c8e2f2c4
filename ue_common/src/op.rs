//! Operator boilerplate for transparent newtypes.
//!
//! All the money types in the workspace are thin wrappers around `i64`. The `op!` macro generates the
//! arithmetic trait impls so that each newtype doesn't have to repeat them.

/// Generate an operator impl for a tuple newtype wrapping a primitive.
///
/// * `op!(binary T, Add, add)` — `T + T -> T`
/// * `op!(inplace T, SubAssign, sub_assign)` — `T -= T`
/// * `op!(unary T, Neg, neg)` — `-T`
#[macro_export]
macro_rules! op {
    (binary $t:ty, $trait:ident, $meth:ident) => {
        impl std::ops::$trait for $t {
            type Output = Self;

            fn $meth(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trait::$meth(self.0, rhs.0))
            }
        }
    };
    (inplace $t:ty, $trait:ident, $meth:ident) => {
        impl std::ops::$trait for $t {
            fn $meth(&mut self, rhs: Self) {
                std::ops::$trait::$meth(&mut self.0, rhs.0)
            }
        }
    };
    (unary $t:ty, $trait:ident, $meth:ident) => {
        impl std::ops::$trait for $t {
            type Output = Self;

            fn $meth(self) -> Self::Output {
                Self(std::ops::$trait::$meth(self.0))
            }
        }
    };
}
