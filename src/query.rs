// Copyright 2024 the oscompute authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Building blocks for query strings.

use std::borrow::Cow;
use std::ops::{Deref, DerefMut};

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// One key-value item of a query string.
pub trait QueryItem {
    /// The key and the rendered value of this item.
    ///
    /// Converting a value may fail, e.g. when it cannot be represented in
    /// the target API version.
    fn query_item(&self) -> Result<(&str, Cow<str>), crate::Error>;
}

/// An ordered list of query items.
///
/// Serializes as a sequence of key-value pairs, so an item that is not in
/// the list is simply absent from the resulting query string, and the same
/// key may appear more than once. The type `T` is normally an enum
/// implementing [QueryItem](trait.QueryItem.html), one variant per possible
/// key:
///
/// ```rust
/// use std::borrow::Cow;
/// use oscompute::{Error, Query, QueryItem};
///
/// #[derive(Debug)]
/// enum ServerQueryItem {
///     Name(String),
///     AllTenants(bool),
///     Limit(usize),
/// }
///
/// impl QueryItem for ServerQueryItem {
///     fn query_item(&self) -> Result<(&str, Cow<str>), Error> {
///         Ok(match self {
///             ServerQueryItem::Name(s) => ("name", Cow::Borrowed(s)),
///             ServerQueryItem::AllTenants(s) => ("all_tenants", Cow::Owned(s.to_string())),
///             ServerQueryItem::Limit(s) => ("limit", Cow::Owned(s.to_string())),
///         })
///     }
/// }
///
/// let query = Query::default()
///     .with(ServerQueryItem::AllTenants(true))
///     .with(ServerQueryItem::Name("web".into()))
///     .with(ServerQueryItem::Limit(42))
///     .with(ServerQueryItem::Name("db".into()));
/// let query_string = serde_urlencoded::to_string(query).expect("invalid query");
/// assert_eq!(&query_string, "all_tenants=true&name=web&limit=42&name=db");
/// ```
///
/// Compared to a struct of `Option`s, a `Query` stays small no matter how
/// many filters the API supports.
#[derive(Debug, Clone)]
pub struct Query<T>(pub Vec<T>);

impl<T> Default for Query<T> {
    fn default() -> Self {
        Query(Vec::new())
    }
}

impl<T> Query<T> {
    /// Append an item, builder style.
    #[inline]
    pub fn with(mut self, item: T) -> Query<T> {
        self.push(item);
        self
    }
}

impl<T> Deref for Query<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Query<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: QueryItem> Serialize for Query<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in &self.0 {
            let (key, value) = item.query_item().map_err(serde::ser::Error::custom)?;
            seq.serialize_element(&(key, value))?;
        }
        seq.end()
    }
}

#[cfg(test)]
pub mod test {
    use std::borrow::Cow;

    use super::{Query, QueryItem};
    use crate::Error;

    #[derive(Debug)]
    #[allow(dead_code)]
    enum ListFilter {
        Name(String),
        Deleted(bool),
        Unused(String),
    }

    impl QueryItem for ListFilter {
        fn query_item(&self) -> Result<(&str, Cow<str>), Error> {
            Ok(match self {
                ListFilter::Name(s) => ("name", Cow::Borrowed(s)),
                ListFilter::Deleted(b) => ("deleted", b.to_string().into()),
                _ => unreachable!(),
            })
        }
    }

    #[test]
    fn test_query() {
        let q = Query::default()
            .with(ListFilter::Deleted(true))
            .with(ListFilter::Name("one".into()))
            .with(ListFilter::Name("two".into()));
        let s = serde_urlencoded::to_string(q).unwrap();
        assert_eq!(&s, "deleted=true&name=one&name=two");
    }

    #[test]
    fn test_query_empty() {
        let q: Query<ListFilter> = Query::default();
        let s = serde_urlencoded::to_string(q).unwrap();
        assert_eq!(&s, "");
    }

    #[test]
    fn test_query_push() {
        let mut q = Query::default();
        let _ = q.push(ListFilter::Name("via-deref".into()));
        assert_eq!(q.len(), 1);
        let s = serde_urlencoded::to_string(q).unwrap();
        assert_eq!(&s, "name=via-deref");
    }
}
