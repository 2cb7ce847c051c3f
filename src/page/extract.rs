// src/page/extract.rs
// =============================================================================
// Pulls the pieces we need out of index pages.
//
// A package page looks roughly like this:
//
//   <ul class="uldep">
//     <li><dl><dt><span class="nonvisual">dep:</span> <a href="/bookworm/libc6">libc6</a></dt>
//   </ul>
//   <ul class="uldep">
//     <li><dl><dt><span class="nonvisual">rec:</span> <a href="...">dbus</a></dt>
//   </ul>
//   <div id="pdownload">
//     <h2>Download libdbus-1-3</h2>
//     <table><tr><th><a href="/bookworm/amd64/libdbus-1-3/download">amd64</a></th></tr></table>
//   </div>
//
// and the artifact-resolution page behind that link lists one <li><a> per mirror:
//
//   <div id="content">
//     <ul><li><a href="http://ftp.us.debian.org/debian/pool/main/d/dbus/...deb">ftp.us.debian.org/debian</a></li></ul>
//   </div>
//
// All functions here are pure: they only read the document they are given.
// =============================================================================

use super::Select;
use crate::config::LIBC_PACKAGE;
use crate::error::Error;

// Heading of the download section: "Download <package>"
const NAME_SELECTOR: &str = "#pdownload h2";
const NAME_PREFIX: &str = "Download ";

// Relation labels. We only follow "dep:" - recommends (rec:), suggests (sug:)
// and enhances (enh:) aren't needed to run the package, and "or" alternatives
// are already covered by the first choice.
const RELATION_SELECTOR: &str = ".uldep dt span";
const HARD_DEPENDENCY: &str = "dep:";

// One link per architecture build in the download table
const BUILD_LINK_SELECTOR: &str = "th a";

// Packages that don't depend on the architecture are filed under "all"
const ARCH_INDEPENDENT: &str = "all";

// Every download location on an artifact-resolution page. Security updates
// only list security.debian.org, which lives outside the mirror list, so we
// look at every link in the content area.
const CANDIDATE_SELECTOR: &str = "#content li a";

pub fn package_name(doc: &dyn Select) -> Result<String, Error> {
    let missing = || Error::Extraction {
        what: "download heading",
        url: doc.url().to_string(),
    };

    let heading = doc.select(NAME_SELECTOR)?.into_iter().next().ok_or_else(missing)?;
    let name = heading
        .text
        .trim()
        .strip_prefix(NAME_PREFIX)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(missing)?;

    Ok(name.to_string())
}

// Hard dependencies in document order. libc6 (and anything carrying its
// name, like libc6.1 on alpha/ia64) is dropped unless `allow_libc`.
pub fn dependencies(doc: &dyn Select, allow_libc: bool) -> Result<Vec<String>, Error> {
    let names = doc
        .select(RELATION_SELECTOR)?
        .into_iter()
        .filter(|relation| relation.text.trim() == HARD_DEPENDENCY)
        .filter_map(|relation| relation.next_sibling)
        .map(|package| package.text.trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| allow_libc || !name.contains(LIBC_PACKAGE))
        .collect();

    Ok(names)
}

// A resolution link from the download table, e.g. "/bookworm/amd64/libcap2/download"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLink {
    pub path: String,
    segments: Vec<String>,
}

impl ArtifactLink {
    pub fn parse(path: &str) -> Self {
        // Leading "/" would give an empty first segment
        let segments = path
            .trim_start_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();
        Self {
            path: path.to_string(),
            segments,
        }
    }

    fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.segment(0)
    }

    pub fn package(&self) -> Option<&str> {
        self.segment(2)
    }

    pub fn is_download(&self) -> bool {
        self.segment(3) == Some("download")
    }

    // A link is only rejected when it is for another version AND isn't a
    // download link. A link failing just one of the two is still followed.
    pub fn is_rejected_for(&self, version: &str) -> bool {
        self.version() != Some(version) && !self.is_download()
    }

    fn has_segment(&self, wanted: &str) -> bool {
        self.segments.iter().any(|segment| segment == wanted)
    }
}

// The resolution link for `arch`. Falls back to the arch-independent ("all")
// build; `None` means the package has no build we can use.
pub fn artifact_link(doc: &dyn Select, arch: &str) -> Result<Option<ArtifactLink>, Error> {
    let links: Vec<ArtifactLink> = doc
        .select(BUILD_LINK_SELECTOR)?
        .iter()
        .filter_map(|field| field.attr("href"))
        .map(ArtifactLink::parse)
        .collect();

    let link = links
        .iter()
        .find(|link| link.has_segment(arch))
        .or_else(|| links.iter().find(|link| link.has_segment(ARCH_INDEPENDENT)))
        .cloned();

    Ok(link)
}

pub fn mirror_candidates(doc: &dyn Select) -> Result<Vec<String>, Error> {
    Ok(doc
        .select(CANDIDATE_SELECTOR)?
        .iter()
        .filter_map(|field| field.attr("href"))
        .map(str::to_string)
        .collect())
}
