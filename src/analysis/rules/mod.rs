pub mod duplicate_decl;
