//! The DEX primitive contract.
//!
//! DEX parsing and method-invocation extraction are external collaborators
//! (spec.md §1 "out of scope"); these traits are the abstract surface the
//! fingerprinting engine needs from them, not an implementation of either.

/// A single method body, exposing the signatures of methods it invokes.
pub trait DexMethod {
    /// Invoked-method signatures, as they would appear in the API allowlist.
    fn invoked_methods(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

/// A single class in a DEX file.
pub trait DexClass {
    /// The class's descriptor name, e.g. `Lcom/google/gson/Gson;` or
    /// `Lcom/google/gson/Gson` — implementations may or may not include a
    /// trailing `;`; callers only rely on the `L`-prefix and `/`-separated
    /// segments.
    fn name(&self) -> &str;

    fn methods(&self) -> Box<dyn Iterator<Item = &dyn DexMethod> + '_>;
}

/// A parsed DEX file, exposing its classes.
pub trait Dex {
    fn classes(&self) -> Box<dyn Iterator<Item = &dyn DexClass> + '_>;
}
