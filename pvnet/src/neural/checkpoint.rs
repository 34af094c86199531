
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tch::nn::VarStore;

use utils::{Serialize, Deserialize};
use utils::error::*;
use utils::log;

use super::error::NetworkError;

///
/// The description of a saved network, stored next to the weights. Its 
/// presence is what marks a checkpoint as restorable.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata 
{
    pub board_width: i64,
    pub board_height: i64,
    pub parameters: BTreeMap<String, Vec<i64>>
}

impl Metadata 
{
    ///
    /// Describes the parameters currently held by a var store.
    ///
    pub fn describe (vs: & VarStore, board_width: i64, board_height: i64) -> Metadata 
    {
        let parameters = vs.variables().into_iter().map(|(name, t)| (name, t.size())).collect();
        Metadata { board_width, board_height, parameters }
    }

    ///
    /// Explains why a checkpoint with this metadata cannot be loaded into 
    /// a network described by `expected`, if it cannot.
    ///
    pub fn incompatibility (& self, expected: & Metadata) -> Option<String>
    {
        if (self.board_width, self.board_height) != (expected.board_width, expected.board_height)
        {
            return Some(format!("saved for a {}x{} board, expected {}x{}", 
                self.board_width, self.board_height, expected.board_width, expected.board_height));
        }

        for (name, size) in & expected.parameters 
        {
            match self.parameters.get(name) 
            {
                None => return Some(format!("parameter '{}' is missing", name)),
                Some(saved) if saved != size => return Some(format!("parameter '{}' has shape {:?}, expected {:?}", name, saved, size)),
                _ => {}
            }
        }

        self.parameters.keys()
            .find(|name| !expected.parameters.contains_key(* name))
            .map(|name| format!("unexpected parameter '{}'", name))
    }
}

///
/// A checkpoint on disk, identified by a base path P. The weights live 
/// at P.ot and the metadata at P.meta.
///
#[derive(Clone, Debug)]
pub struct Checkpoint 
{
    base: PathBuf
}

impl Checkpoint 
{
    pub fn new<P: AsRef<Path>> (base: P) -> Checkpoint 
    {
        Checkpoint { base: base.as_ref().to_path_buf() }
    }

    pub fn weights_path (& self) -> PathBuf 
    {
        self.with_suffix(".ot")
    }

    pub fn meta_path (& self) -> PathBuf 
    {
        self.with_suffix(".meta")
    }

    ///
    /// Returns whether a checkpoint has been written at this path.
    ///
    pub fn exists (& self) -> bool 
    {
        self.meta_path().exists()
    }

    ///
    /// Writes the var store's parameters and their description.
    ///
    pub fn save (& self, vs: & VarStore, meta: & Metadata) -> Result<()>
    {
        if let Some(parent) = self.base.parent().filter(|p| !p.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).context(format!("Failed to create checkpoint directory '{}'.", parent.display()))?;
        }

        let weights = self.weights_path();
        vs.save(& weights).context(format!("Failed to save model to path '{}'.", weights.display()))?;
        utils::write_toml(& self.meta_path(), meta)?;

        log::info!("Saved checkpoint '{}'.", self.base.display());
        Ok(())
    }

    ///
    /// Loads the parameters into the var store after checking that the 
    /// checkpoint was written by a network of the same shape.
    ///
    pub fn restore (& self, vs: & mut VarStore, expected: & Metadata) -> Result<()>
    {
        if !self.exists() 
        {
            return Err(NetworkError::MissingCheckpoint(self.meta_path().display().to_string()).into());
        }

        let meta : Metadata = utils::read_toml(& self.meta_path())?;
        if let Some(reason) = meta.incompatibility(expected)
        {
            return Err(NetworkError::CheckpointMismatch { path: self.base.display().to_string(), reason }.into());
        }

        let weights = self.weights_path();
        vs.load(& weights).context(format!("Failed to load weights file from '{}'.", weights.display()))?;

        log::info!("Restored checkpoint '{}'.", self.base.display());
        Ok(())
    }

    fn with_suffix (& self, suffix: & str) -> PathBuf 
    {
        let mut path = OsString::from(self.base.as_os_str());
        path.push(suffix);
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests 
{
    use super::*;

    fn meta (width: i64, shapes: & [(& str, Vec<i64>)]) -> Metadata 
    {
        let parameters = shapes.iter().map(|(n, s)| (n.to_string(), s.clone())).collect();
        Metadata { board_width: width, board_height: width, parameters }
    }

    #[test]
    fn companion_files_extend_the_base () 
    {
        let checkpoint = Checkpoint::new("./model/tf_policy_8_8_5_model");

        assert_eq!(checkpoint.weights_path(), PathBuf::from("./model/tf_policy_8_8_5_model.ot"));
        assert_eq!(checkpoint.meta_path(), PathBuf::from("./model/tf_policy_8_8_5_model.meta"));
    }

    #[test]
    fn absent_checkpoint_does_not_exist () 
    {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("nothing"));

        assert!(!checkpoint.exists());

        let mut vs = VarStore::new(tch::Device::Cpu);
        let err = checkpoint.restore(& mut vs, & meta(8, & [])).unwrap_err();
        assert!(matches!(err.downcast_ref::<NetworkError>(), Some(NetworkError::MissingCheckpoint(_))));
    }

    #[test]
    fn incompatibilities_are_explained () 
    {
        let expected = meta(8, & [("conv1.weight", vec![32, 4, 3, 3]), ("conv1.bias", vec![32])]);

        assert_eq!(expected.incompatibility(& expected), None);

        let smaller = meta(6, & [("conv1.weight", vec![32, 4, 3, 3]), ("conv1.bias", vec![32])]);
        assert!(smaller.incompatibility(& expected).unwrap().contains("6x6"));

        let reshaped = meta(8, & [("conv1.weight", vec![16, 4, 3, 3]), ("conv1.bias", vec![32])]);
        assert!(reshaped.incompatibility(& expected).unwrap().contains("conv1.weight"));

        let missing = meta(8, & [("conv1.weight", vec![32, 4, 3, 3])]);
        assert!(missing.incompatibility(& expected).unwrap().contains("conv1.bias"));

        let extra = meta(8, & [("conv1.weight", vec![32, 4, 3, 3]), ("conv1.bias", vec![32]), ("conv9.bias", vec![1])]);
        assert!(extra.incompatibility(& expected).unwrap().contains("conv9.bias"));
    }

    #[test]
    fn saving_creates_parent_directories () 
    {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("nested/deeper/model"));

        let vs = VarStore::new(tch::Device::Cpu);
        let _ = vs.root().zeros("weight", & [2, 2]);
        let description = Metadata::describe(& vs, 3, 3);

        checkpoint.save(& vs, & description).unwrap();

        assert!(checkpoint.exists());
        assert!(checkpoint.weights_path().exists());
        assert_eq!(utils::read_toml::<Metadata>(& checkpoint.meta_path()).unwrap(), description);
    }
}
