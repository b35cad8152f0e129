//! Service descriptor discovery.
//!
//! Reads `META-INF/services/<factoryId>` through the loader's resource lookup
//! and takes the first line that is neither blank nor a comment.

use factory_finder_api::{
    Discovery, DiscoveryError, DiscoveryStrategy, FactoryId, LoaderContext, ResourceRoot,
};
use std::io::{self, BufRead, BufReader, Read};
use std::sync::Arc;

/// Strip a `#` comment, then trim leading and trailing spaces and tabs.
///
/// Only `' '` and `'\t'` are trimmed; other whitespace is kept.
pub fn sanitize(line: Option<&str>) -> Option<String> {
    let line = line?;
    let line = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    Some(line.trim_matches([' ', '\t']).to_string())
}

/// First non-empty sanitized line of a descriptor, or `None` at end of input.
///
/// Lines end at `\n`, `\r\n` or a lone `\r`. Bytes that are not valid
/// UTF-8 decode to U+FFFD, so a stray byte in a comment is dropped along
/// with the comment.
pub fn first_service_name(mut reader: impl BufRead) -> Result<Option<String>, DiscoveryError> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        for line in buf.split(|&b| b == b'\n' || b == b'\r') {
            let line = String::from_utf8_lossy(line);
            match sanitize(Some(&*line)) {
                Some(name) if !name.is_empty() => return Ok(Some(name)),
                _ => continue,
            }
        }
    }
}

pub struct ServiceDescriptorDiscovery {
    /// Roots consulted for the system context (no loader).
    system_roots: Vec<Arc<dyn ResourceRoot>>,
}

impl ServiceDescriptorDiscovery {
    pub fn new(system_roots: Vec<Arc<dyn ResourceRoot>>) -> Self {
        Self { system_roots }
    }

    fn open_descriptor(
        &self,
        resource: &str,
        loader: Option<&LoaderContext>,
    ) -> io::Result<Option<Box<dyn Read + Send>>> {
        if let Some(loader) = loader {
            return loader.open_resource(resource);
        }
        for root in &self.system_roots {
            if let Some(reader) = root.open(resource)? {
                return Ok(Some(reader));
            }
        }
        Ok(None)
    }
}

impl Default for ServiceDescriptorDiscovery {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl DiscoveryStrategy for ServiceDescriptorDiscovery {
    fn name(&self) -> &str {
        "service-descriptor"
    }

    fn discover(
        &self,
        factory_id: &str,
        loader: Option<&LoaderContext>,
    ) -> Result<Discovery, DiscoveryError> {
        let resource = FactoryId::from(factory_id).descriptor_path();
        let Some(reader) = self.open_descriptor(&resource, loader)? else {
            return Ok(Discovery::NotFound);
        };
        let name = first_service_name(BufReader::new(reader))?;
        Ok(Discovery::from(name))
    }
}
