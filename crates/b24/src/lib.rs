//! ARIB STD-B24の文字符号を変換するためのクレート。
//!
//! 番組情報・サービス名・字幕など、MPEG2-TSのメタデータに埋め込まれた
//! 8単位符号のテキストをデコード・エンコードする。
//! 符号はISO/IEC 2022に基づき、エスケープシーケンスによる符号の指示、
//! ロッキングシフト・単独シフトによる呼び出し、マクロの展開を含む。
//!
//! 字幕向けの制御符号の描画には対応せず、テキストとして読める範囲の
//! 文字変換のみを扱う。
//!
//! # サンプル
//!
//! ```
//! use b24::charset::{ARIB_B24, Charset};
//!
//! let mut text = String::new();
//! ARIB_B24.decode(&mut text, &[0x1B, 0x28, 0x4A, 0x41, 0x42]).unwrap();
//! assert_eq!(text, "AB");
//! ```

#![deny(missing_docs)]

pub mod charset;
pub mod decode;
pub mod encode;
pub mod table;

pub use charset::{AribB24, Charset, CharsetRegistry};
pub use decode::DecodeError;
pub use encode::EncodeResult;
