use crate::prelude::*;
use easy_ext::ext;
use std::path::Path;

#[ext(PathExt)]
pub(crate) impl Path {
    fn to_utf8(&self) -> Result<&Utf8Path> {
        Utf8Path::from_path(self).with_context(|| format!("Path is not UTF8: {self:?}"))
    }
}
