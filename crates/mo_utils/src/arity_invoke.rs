/// Calls `$macro` once per arity from 0 to 8 with indexed type parameters.
///
/// # Example
///
/// ```ignore
/// arity_invoke!(my_macro);
/// // expands to
/// my_macro!(0: []);
/// my_macro!(1: [0: A0]);
/// my_macro!(2: [0: A0, 1: A1]);
/// // ...
/// my_macro!(8: [0: A0, 1: A1, 2: A2, 3: A3, 4: A4, 5: A5, 6: A6, 7: A7]);
/// ```
#[macro_export]
macro_rules! arity_invoke {
    ($(#[$meta:meta])* $macro:ident) => {
        $(#[$meta])* $macro!(0: []);
        $(#[$meta])* $macro!(1: [0: A0]);
        $(#[$meta])* $macro!(2: [0: A0, 1: A1]);
        $(#[$meta])* $macro!(3: [0: A0, 1: A1, 2: A2]);
        $(#[$meta])* $macro!(4: [0: A0, 1: A1, 2: A2, 3: A3]);
        $(#[$meta])* $macro!(5: [0: A0, 1: A1, 2: A2, 3: A3, 4: A4]);
        $(#[$meta])* $macro!(6: [0: A0, 1: A1, 2: A2, 3: A3, 4: A4, 5: A5]);
        $(#[$meta])* $macro!(7: [0: A0, 1: A1, 2: A2, 3: A3, 4: A4, 5: A5, 6: A6]);
        $(#[$meta])* $macro!(8: [0: A0, 1: A1, 2: A2, 3: A3, 4: A4, 5: A5, 6: A6, 7: A7]);
    };
}
