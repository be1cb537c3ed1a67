//! Tuple composition for projections.
//!
//! Every column added to a projection appends one element to the projection's
//! output tuple. Statements with a single column produce the bare value
//! instead of a one-element tuple.

/// Appends one element to a tuple.
pub trait Append<T> {
    /// The tuple with `T` at the end.
    type Output;

    /// Appends `value`.
    fn append(self, value: T) -> Self::Output;
}

impl<T> Append<T> for () {
    type Output = (T,);

    fn append(self, value: T) -> Self::Output {
        (value,)
    }
}

macro_rules! impl_append {
    ($($name:ident),+) => {
        impl<$($name,)+ T> Append<T> for ($($name,)+) {
            type Output = ($($name,)+ T);

            #[allow(non_snake_case)]
            fn append(self, value: T) -> Self::Output {
                let ($($name,)+) = self;
                ($($name,)+ value)
            }
        }
    };
}

impl_append!(A);
impl_append!(A, B);
impl_append!(A, B, C);
impl_append!(A, B, C, D);
impl_append!(A, B, C, D, E);
impl_append!(A, B, C, D, E, F);
impl_append!(A, B, C, D, E, F, G);
impl_append!(A, B, C, D, E, F, G, H);
impl_append!(A, B, C, D, E, F, G, H, I);
impl_append!(A, B, C, D, E, F, G, H, I, J);
impl_append!(A, B, C, D, E, F, G, H, I, J, K);

/// Turns a projection tuple into a statement's row type.
pub trait Flatten {
    /// `A` for `(A,)`, the tuple itself otherwise.
    type Output;

    /// Flattens the tuple.
    fn flatten(self) -> Self::Output;
}

impl<A> Flatten for (A,) {
    type Output = A;

    fn flatten(self) -> Self::Output {
        self.0
    }
}

macro_rules! impl_flatten {
    ($($name:ident),+) => {
        impl<$($name),+> Flatten for ($($name,)+) {
            type Output = Self;

            fn flatten(self) -> Self::Output {
                self
            }
        }
    };
}

impl_flatten!(A, B);
impl_flatten!(A, B, C);
impl_flatten!(A, B, C, D);
impl_flatten!(A, B, C, D, E);
impl_flatten!(A, B, C, D, E, F);
impl_flatten!(A, B, C, D, E, F, G);
impl_flatten!(A, B, C, D, E, F, G, H);
impl_flatten!(A, B, C, D, E, F, G, H, I);
impl_flatten!(A, B, C, D, E, F, G, H, I, J);
impl_flatten!(A, B, C, D, E, F, G, H, I, J, K);
impl_flatten!(A, B, C, D, E, F, G, H, I, J, K, L);
