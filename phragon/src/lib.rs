//! # phragon - Path Patterns and Shared Loadables
//!
//! `phragon` has two independent halves:
//!
//! - **Path patterns**: templates such as `/user/{id:int}` compile into an
//!   anchored matcher plus a reverse generator. Named patterns live in a
//!   [`UrlPattern`] registry that also builds complete URLs.
//! - **Loadables**: lazily imported modules shared by every consumer through a
//!   [`LoadableRegistry`]; each consumer runs its own delay/timeout/retry state
//!   machine in an [`Observer`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phragon::prelude::*;
//!
//! let urls = UrlPattern::new();
//! urls.set("post", "/blog/{day:date(Y-m-d)}/{slug}")?;
//!
//! let params = urls.matches("post", "/blog/2021-02-28/hello").unwrap();
//! let back = urls.make_url(&UrlOptions::named("post").params(params))?;
//! assert_eq!(back, "/blog/2021-02-28/hello");
//! ```
//!
//! ## Loadables
//!
//! ```rust,ignore
//! let registry = LoadableRegistry::new();
//! let page = registry.component(
//!     "page",
//!     || async { Ok(Arc::new(Page::default())) },
//!     LoadableOptions::new().timeout(Duration::from_secs(10)),
//! );
//!
//! let observer = page.observe();
//! let mounted = observer.subscribe(|state| println!("{:?}", state.phase()));
//! // ... later, on unmount:
//! drop(mounted);
//! ```

#![deny(clippy::pub_use, clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use phragon_core::{
    // Error types
    BoxError,
    BuildError,
    // Loadable traits
    DynImporter,
    Importer,
    LoadError,
    // Modifier traits
    MatchOutcome,
    Modifier,
    // Values
    Params,
    PatternError,
    PhragonError,
    Validator,
    Value,
};

// Patterns
pub use phragon_std::pattern::{Pattern, PatternCache, Token};

// URLs
pub use phragon_std::url::{
    Protocol, RouteDefinition, Search, UrlOptions, UrlPath, UrlPattern, build_query,
};

// Loadables
pub use phragon_std::loadable::{
    EntryStatus, LoadView, Loadable, LoadableOptions, LoadableRegistry, LoaderEntry, Observer,
    ObserverState, Phase, Subscription,
};

/// Built-in modifiers and the modifier registry.
pub mod modifiers {
    pub use phragon_std::modifiers::{
        DateModifier, EnumModifier, IntModifier, ModifierRegistry, RegModifier, date::DateFormat,
    };
}

/// Template tokenizer.
pub mod parser {
    pub use phragon_std::pattern::{ModifierCall, ParamToken, Token, parser::tokenize};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use phragon_std::testing::*;
}

/// Prelude module - common imports for Phragon.
///
/// # Usage
///
/// ```rust,ignore
/// use phragon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        BuildError,
        // Loadables
        Importer,
        LoadError,
        LoadView,
        LoadableOptions,
        LoadableRegistry,
        Observer,
        // Values
        Params,
        // Patterns
        Pattern,
        PatternError,
        Phase,
        Protocol,
        // URLs
        UrlOptions,
        UrlPattern,
        Value,
        modifiers::ModifierRegistry,
    };
}
