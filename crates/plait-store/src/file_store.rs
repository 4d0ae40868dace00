//! Filesystem-backed fragment store.
//!
//! Every object lives in a coding directory as `k + m` fragment files plus a
//! TOML metadata file. Writes go through a temporary file and a rename so a
//! crash never leaves a half-written fragment under its final name.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use plait_layer::{EncodedObject, FragmentSource};
use plait_types::{FragmentId, ObjectMeta};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::naming::FragmentNames;

/// Health of one fragment file as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentStatus {
    /// Present with the expected size.
    Healthy,
    /// The file does not exist.
    Missing,
    /// The file exists but its length does not match the layout.
    WrongSize { actual: u64 },
    /// The content does not hash to the recorded digest.
    Corrupt,
}

/// Fragments and metadata of one object inside a coding directory.
///
/// Implements [`FragmentSource`]: anything but a [`FragmentStatus::Healthy`]
/// fragment reports as absent, and a digest mismatch found on a
/// whole-fragment read demotes the fragment to [`FragmentStatus::Corrupt`].
#[derive(Debug)]
pub struct FileStore {
    names: FragmentNames,
    meta: ObjectMeta,
    status: RwLock<Vec<FragmentStatus>>,
    /// Open read handles, one slot per fragment.
    handles: Vec<Mutex<Option<File>>>,
}

impl FileStore {
    /// Write an encoded object into `dir`, creating the directory if needed.
    pub fn save(dir: impl AsRef<Path>, encoded: &EncodedObject) -> Result<Self, StoreError> {
        let meta = &encoded.meta;
        let names = FragmentNames::new(dir.as_ref(), &meta.name, meta.k, meta.m)?;
        fs::create_dir_all(names.dir())?;

        for (index, fragment) in encoded.fragments.iter().enumerate() {
            let path = names.fragment(index);
            write_atomic(&path, fragment)?;
            debug!(index, path = %path.display(), size = fragment.len(), "stored fragment");
        }
        let text = toml::to_string_pretty(meta)?;
        write_atomic(&names.meta(), text.as_bytes())?;

        info!(
            name = %meta.name,
            dir = %names.dir().display(),
            fragments = encoded.fragments.len(),
            "object stored"
        );
        let status = vec![FragmentStatus::Healthy; names.count()];
        Ok(Self {
            handles: empty_handles(names.count()),
            names,
            meta: meta.clone(),
            status: RwLock::new(status),
        })
    }

    /// Open the object called `name` in `dir` from its metadata file.
    ///
    /// Fragment sizes are checked against the layout; contents are only
    /// hashed by [`verify`](Self::verify) or on whole-fragment reads.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self, StoreError> {
        let meta_path = FragmentNames::meta_for(dir.as_ref(), name)?;
        let text = match fs::read_to_string(&meta_path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::MetaNotFound(meta_path));
            }
            Err(e) => return Err(e.into()),
        };
        let meta: ObjectMeta = toml::from_str(&text)?;
        let names = FragmentNames::new(dir.as_ref(), &meta.name, meta.k, meta.m)?;

        let expected = meta.fragment_size();
        let status = (0..names.count())
            .map(|index| {
                let path = names.fragment(index);
                let status = match fs::metadata(&path) {
                    Ok(md) if md.len() == expected => FragmentStatus::Healthy,
                    Ok(md) => FragmentStatus::WrongSize { actual: md.len() },
                    Err(_) => FragmentStatus::Missing,
                };
                match status {
                    FragmentStatus::Healthy => {}
                    FragmentStatus::WrongSize { actual } => warn!(
                        index,
                        path = %path.display(),
                        expected,
                        actual,
                        "fragment has wrong size, treating as erased"
                    ),
                    _ => debug!(index, path = %path.display(), "fragment file missing"),
                }
                status
            })
            .collect();

        Ok(Self {
            handles: empty_handles(names.count()),
            names,
            meta,
            status: RwLock::new(status),
        })
    }

    pub fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    pub fn names(&self) -> &FragmentNames {
        &self.names
    }

    pub fn fragment_path(&self, index: usize) -> PathBuf {
        self.names.fragment(index)
    }

    pub fn status(&self, index: usize) -> Option<FragmentStatus> {
        self.status.read().expect("lock poisoned").get(index).copied()
    }

    /// Indices of fragments that are not healthy.
    pub fn unhealthy(&self) -> Vec<usize> {
        let status = self.status.read().expect("lock poisoned");
        status
            .iter()
            .enumerate()
            .filter(|(_, s)| **s != FragmentStatus::Healthy)
            .map(|(i, _)| i)
            .collect()
    }

    /// Hash every healthy fragment and demote those whose digest does not
    /// match the metadata. Returns the number of corrupt fragments found.
    pub fn verify(&self) -> Result<usize, StoreError> {
        let mut corrupt = 0;
        for index in 0..self.names.count() {
            if self.status(index) != Some(FragmentStatus::Healthy) {
                continue;
            }
            let mut hasher = blake3::Hasher::new();
            hasher.update_reader(File::open(self.names.fragment(index))?)?;
            let actual = FragmentId::from(*hasher.finalize().as_bytes());
            if actual != self.meta.fragments[index] {
                self.mark_corrupt(index, &actual);
                corrupt += 1;
            }
        }
        Ok(corrupt)
    }

    /// Store the rebuilt content of fragment `index`.
    ///
    /// The data must hash to the digest recorded for that fragment.
    pub fn write_fragment(&self, index: usize, data: &[u8]) -> Result<(), StoreError> {
        let count = self.names.count();
        if index >= count {
            return Err(StoreError::FragmentIndex { index, count });
        }
        if FragmentId::from_data(data) != self.meta.fragments[index] {
            return Err(StoreError::DigestMismatch { index });
        }
        let path = self.names.fragment(index);
        write_atomic(&path, data)?;
        // The rename replaced the file; a cached handle still sees the old one.
        self.handles[index].lock().expect("lock poisoned").take();
        self.status.write().expect("lock poisoned")[index] = FragmentStatus::Healthy;
        info!(index, path = %path.display(), "fragment rewritten");
        Ok(())
    }

    /// Write the decoded object next to its fragments.
    pub fn write_decoded(&self, data: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.names.decoded();
        write_atomic(&path, data)?;
        debug!(path = %path.display(), size = data.len(), "decoded object written");
        Ok(path)
    }

    fn mark_corrupt(&self, index: usize, actual: &FragmentId) {
        warn!(
            index,
            expected = %self.meta.fragments[index],
            actual = %actual,
            "fragment digest mismatch, treating as erased"
        );
        self.handles[index].lock().expect("lock poisoned").take();
        self.status.write().expect("lock poisoned")[index] = FragmentStatus::Corrupt;
    }
}

fn empty_handles(count: usize) -> Vec<Mutex<Option<File>>> {
    (0..count).map(|_| Mutex::new(None)).collect()
}

impl FragmentSource for FileStore {
    fn is_present(&self, index: usize) -> bool {
        self.status(index) == Some(FragmentStatus::Healthy)
    }

    fn read_at(&self, index: usize, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        if !self.is_present(index) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("fragment {index} unavailable"),
            ));
        }
        {
            let mut slot = self.handles[index].lock().expect("lock poisoned");
            let file = match &mut *slot {
                Some(file) => file,
                empty => empty.insert(File::open(self.names.fragment(index))?),
            };
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(buf)?;
        }

        if offset == 0 && buf.len() as u64 == self.meta.fragment_size() {
            let actual = FragmentId::from_data(buf);
            if actual != self.meta.fragments[index] {
                self.mark_corrupt(index, &actual);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("fragment {index} digest mismatch"),
                ));
            }
        }
        Ok(())
    }
}

/// Write `data` to `path` via a sibling temporary file and a rename.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}
