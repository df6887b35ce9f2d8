//! Re-serialization of the URI model.

use std::fmt;

use crate::chars;
use crate::parse::{Authority, Param, Query, Uri};

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(authority) = &self.authority {
            write!(f, "//{authority}")?;
        }
        f.write_str(&self.path.text())?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            f.write_str("#")?;
            chars::write_escaped(f, fragment, chars::is_fragment)?;
        }
        Ok(())
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(userinfo) = &self.userinfo {
            chars::write_escaped(f, userinfo, chars::is_userinfo)?;
            f.write_str("@")?;
        }
        if self.literal {
            write!(f, "[{}]", self.host)?;
        } else {
            chars::write_escaped(f, &self.host, chars::is_regname)?;
        }
        if let Some(port) = &self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str("&")?;
            }
            write!(f, "{param}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        chars::write_escaped(f, &self.key, chars::is_query_part)?;
        if self.has_equals {
            f.write_str("=")?;
            chars::write_escaped(f, &self.value, chars::is_query_part)?;
        }
        Ok(())
    }
}
