pub mod cube_cloud_pass;
