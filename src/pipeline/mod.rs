//! Pipeline stages for topic-to-PDF generation.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the network-facing ones can be replaced by test doubles.
//!
//! ## Data Flow
//!
//! ```text
//! llm ──▶ search ──▶ theme ──▶ compose ──▶ render
//! (text)  (URLs)     (colours) (fetch + encode + layout)  (pdf-writer)
//! ```
//!
//! 1. [`llm`]: one chat completion through `edgequake-llm`
//! 2. [`search`]: Pexels image search, capped at two URLs
//! 3. [`cached`]: TTL-cache decorators for the two providers above
//! 4. [`theme`]: background and text colours for the topic
//! 5. [`compose`]: paginate title, paragraphs and images; uses [`fetch`]
//!    and [`encode`] for each image and [`layout`]/[`fonts`] for text
//! 6. [`render`]: serialise the composed pages to PDF bytes

pub mod cached;
pub mod compose;
pub mod encode;
pub mod fetch;
pub mod fonts;
pub mod layout;
pub mod llm;
pub mod render;
pub mod search;
pub mod theme;
