pub(crate) mod ustr;
