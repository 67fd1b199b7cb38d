//! # Webhook Filter Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/        # End-to-end registry flows
//!     ├── lifecycle.rs    # Subscription create / sync / delete
//!     ├── delivery.rs     # Delivery-time matching and dry runs
//!     └── concurrency.rs  # Syncs racing delivery-time reads
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p wh-tests
//! cargo test -p wh-tests integration::delivery
//!
//! # Benchmarks
//! cargo bench -p wh-tests
//! ```

pub mod integration;
